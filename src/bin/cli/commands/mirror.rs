use rskeb::client::SkebClient;
use rskeb::config::Config;
use rskeb::jobs::{mirror_newest, MirrorOptions};
use rskeb::storage::MirrorStore;

use crate::output::{self, OutputConfig};

/// Executes the external-link mirroring scan
pub async fn execute(
    store: &dyn MirrorStore,
    config: &Config,
    number: usize,
    out: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = SkebClient::new(&config.site_url)?;
    let opts = MirrorOptions { candidates: number, timespan: config.timespan() };
    let summary = mirror_newest(&client, store, &opts).await?;
    output::print_mirror_summary(&summary, out);
    Ok(())
}
