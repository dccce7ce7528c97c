//! Mirror state bookkeeping
//!
//! Every piece of run state lives as a file inside the mirror itself, so a
//! fresh machine picks up exactly where the previous run stopped. The
//! functions here load those files (tolerating their absence on a new
//! mirror) and render updated versions as [`CommitOp`]s for the caller to
//! bundle into a single commit.

pub mod artwork_repo;
pub mod readme;
pub mod record_repo;
pub mod state_repo;
pub mod tag_repo;

use crate::storage::CommitOp;

/// Seen-post dedup keys
pub const SEEN_FILE: &str = "exist_sids.json";
/// Pending posts discovered through similar-works links
pub const QUEUE_FILE: &str = "queue.json";
/// Metadata of every mirrored artwork
pub const ARTWORKS_FILE: &str = "artworks.json";
/// Tag statistics table
pub const TAGS_FILE: &str = "tags.csv";
/// Pack record table
pub const RECORDS_FILE: &str = "records.csv";
/// Repacked archive index
pub const INDEX_FILE: &str = "index.json";
pub const README_FILE: &str = "README.md";

/// Directory of finished packs
pub const PACKS_DIR: &str = "packs";
/// Per-resource archives awaiting repacking
pub const UNARCHIVED_DIR: &str = "unarchived";
/// Per-resource archives already folded into a pack
pub const ARCHIVED_DIR: &str = "archived";

pub(crate) fn json_op<T: serde::Serialize>(path: &str, value: &T) -> CommitOp {
    let bytes = serde_json::to_vec(value).expect("state serializes");
    CommitOp::add_bytes(path, bytes)
}

pub(crate) fn json_pretty_op<T: serde::Serialize>(path: &str, value: &T) -> CommitOp {
    let bytes = serde_json::to_vec_pretty(value).expect("state serializes");
    CommitOp::add_bytes(path, bytes)
}

pub(crate) fn csv_op<T: serde::Serialize>(path: &str, rows: &[T]) -> anyhow::Result<CommitOp> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(CommitOp::add_bytes(path, writer.into_inner()?))
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use crate::storage::MemoryStore;

    /// Fresh in-memory mirror for repo-layer tests
    pub fn setup_test_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }
}
