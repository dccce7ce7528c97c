use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// A minimum-interval pacer for outbound requests
///
/// `wait` sleeps until at least one jittered interval has elapsed since the
/// previous `wait` returned. The jitter spreads request timing by ±10% of
/// the base interval so runs don't hammer the site on a fixed beat.
#[derive(Debug)]
pub struct Throttle {
    base: Duration,
    jitter_ratio: f64,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(base: Duration) -> Self {
        Self { base, jitter_ratio: 0.1, last: None }
    }

    /// Seconds-based constructor matching how intervals are configured
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(Duration::from_secs_f64(secs))
    }

    fn jittered(&self) -> Duration {
        let ratio = self.jitter_ratio;
        let scale = (1.0 - ratio) + 2.0 * ratio * rand::rng().random_range(0.0..1.0);
        self.base.mul_f64(scale)
    }

    /// Sleeps out the remainder of the current interval, if any
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let due = last + self.jittered();
            let now = Instant::now();
            if due > now {
                tokio::time::sleep(due - now).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
