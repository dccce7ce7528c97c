use anyhow::Result;

use crate::models::ArtworkRecord;
use crate::storage::{CommitOp, MirrorStore};

use super::{json_pretty_op, ARTWORKS_FILE};

/// Loads the artwork metadata index, empty on a fresh mirror
pub async fn load_artworks(store: &dyn MirrorStore) -> Result<Vec<ArtworkRecord>> {
    if !store.exists(ARTWORKS_FILE).await? {
        return Ok(Vec::new());
    }
    let bytes = store.read(ARTWORKS_FILE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Renders the artwork index back to its state file, sorted by artwork id
pub fn save_artworks_op(mut artworks: Vec<ArtworkRecord>) -> CommitOp {
    artworks.sort_by_key(|a| a.id);
    json_pretty_op(ARTWORKS_FILE, &artworks)
}
