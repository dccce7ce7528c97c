use rskeb::client::SkebClient;
use rskeb::config::Config;
use rskeb::jobs::{crawl_newest, NewestOptions};
use rskeb::storage::MirrorStore;

use crate::output::{self, OutputConfig};

/// Executes the newest-works crawl
pub async fn execute(
    store: &dyn MirrorStore,
    config: &Config,
    number: usize,
    out: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = SkebClient::new(&config.site_url)?;
    let opts = NewestOptions {
        candidates: number,
        max_items: config.max_items,
        max_runtime: config.max_runtime(),
        timespan: config.timespan(),
    };
    let summary = crawl_newest(&client, store, &opts).await?;
    output::print_crawl_summary(&summary, out);
    Ok(())
}
