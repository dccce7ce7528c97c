use crate::errors::MirrorError;
use crate::models::{PackRecord, TagRecord};
use crate::repo::artwork_repo::load_artworks;
use crate::repo::record_repo::load_records;
use crate::repo::state_repo::{load_queue, load_seen};
use crate::repo::tag_repo::load_tags;
use crate::storage::MirrorStore;

/// A read-only snapshot of the mirror's bookkeeping
#[derive(Debug)]
pub struct StatusReport {
    pub records: Vec<PackRecord>,
    pub tags: Vec<TagRecord>,
    pub artworks: usize,
    pub seen: usize,
    pub queued: usize,
}

/// Reads the mirror's state files into a status report
pub async fn mirror_status(store: &dyn MirrorStore) -> Result<StatusReport, MirrorError> {
    Ok(StatusReport {
        records: load_records(store).await?,
        tags: load_tags(store).await?,
        artworks: load_artworks(store).await?.len(),
        seen: load_seen(store).await?.len(),
        queued: load_queue(store).await?.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::setup_test_store;

    #[tokio::test]
    async fn test_status_of_fresh_mirror_is_empty() {
        let store = setup_test_store();
        let report = mirror_status(store.as_ref()).await.unwrap();
        assert!(report.records.is_empty());
        assert!(report.tags.is_empty());
        assert_eq!(report.artworks, 0);
        assert_eq!(report.seen, 0);
        assert_eq!(report.queued, 0);
    }
}
