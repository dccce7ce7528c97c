use rskeb::jobs::mirror_status;
use rskeb::storage::MirrorStore;

use crate::output::{self, OutputConfig};

/// Prints the mirror's bookkeeping
pub async fn execute(
    store: &dyn MirrorStore,
    out: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = mirror_status(store).await?;
    output::print_status(&report, out);
    Ok(())
}
