use rskeb::jobs::repack_all;
use rskeb::storage::MirrorStore;

use crate::output::{self, OutputConfig};

/// Executes the repack job
pub async fn execute(
    store: &dyn MirrorStore,
    out: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match repack_all(store).await? {
        Some(pack_name) => {
            output::print_success(&format!("Created pack {pack_name}"), out);
        }
        None => {
            output::print_success("Nothing to repack", out);
        }
    }
    Ok(())
}
