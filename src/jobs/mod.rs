//! Batch operations: the things a scheduled run actually does
//!
//! Each job loads its state from the mirror, works inside a scratch
//! directory, and lands everything it produced in a single commit, so an
//! interrupted run leaves the mirror exactly as the previous run did.

mod mirror;
mod newest;
mod repack;
mod status;

pub use mirror::{mirror_newest, try_process_url, MirrorOptions, MirrorSummary};
pub use newest::{crawl_newest, CrawlSummary, NewestOptions};
pub use repack::repack_all;
pub use status::{mirror_status, StatusReport};

/// Timestamp slug for pack names, microsecond precision
pub(crate) fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S_%6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_slug_shape() {
        let slug = timestamp_slug();
        // 8 date digits, 6 time digits, 6 fractional digits
        let parts: Vec<&str> = slug.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 6);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }
}
