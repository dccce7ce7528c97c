use anyhow::Result;
use tracing::debug;

use crate::models::{IndexRecord, PackRecord};
use crate::storage::{CommitOp, MirrorStore};

use super::{csv_op, json_pretty_op, INDEX_FILE, PACKS_DIR, RECORDS_FILE};

/// Loads the pack record table, empty on a fresh mirror
pub async fn load_records(store: &dyn MirrorStore) -> Result<Vec<PackRecord>> {
    if !store.exists(RECORDS_FILE).await? {
        return Ok(Vec::new());
    }
    let bytes = store.read(RECORDS_FILE).await?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Renders the pack record table, newest pack first
///
/// Pack filenames embed their creation timestamp, so a reverse name sort is
/// a reverse chronological sort.
pub fn save_records_op(mut records: Vec<PackRecord>) -> Result<CommitOp> {
    records.sort_by(|a, b| b.filename.cmp(&a.filename));
    csv_op(RECORDS_FILE, &records)
}

/// Loads the repacked-archive index
///
/// Mirrors predating the index file are reconstructed by listing `packs/`
/// and asking the store for each pack's size.
pub async fn load_index(store: &dyn MirrorStore) -> Result<Vec<IndexRecord>> {
    if store.exists(INDEX_FILE).await? {
        let bytes = store.read(INDEX_FILE).await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let mut records = Vec::new();
    for path in store.list(PACKS_DIR).await? {
        if !path.ends_with(".zip") {
            continue;
        }
        let size = store.size(&path).await?;
        let filename = path.rsplit('/').next().unwrap_or(&path).to_string();
        debug!(%filename, size, "index rebuilt from pack listing");
        records.push(IndexRecord { filename, size });
    }
    Ok(records)
}

/// Renders the repacked-archive index, newest pack first
pub fn save_index_op(mut records: Vec<IndexRecord>) -> CommitOp {
    records.sort_by(|a, b| b.filename.cmp(&a.filename));
    json_pretty_op(INDEX_FILE, &records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::setup_test_store;
    use crate::storage::CommitOp as Op;

    #[tokio::test]
    async fn test_records_round_trip_newest_first() {
        let store = setup_test_store();

        let records = vec![
            PackRecord {
                filename: "skb_newest_pack_20240101_000000_000000.zip".into(),
                images: 4,
                size: "1.000 MiB".into(),
                download: "[Download](memory://packs/a.zip)".into(),
            },
            PackRecord {
                filename: "skb_newest_pack_20240301_000000_000000.zip".into(),
                images: 2,
                size: "512 B".into(),
                download: "[Download](memory://packs/b.zip)".into(),
            },
        ];
        store.commit(vec![save_records_op(records).unwrap()], "state").await.unwrap();

        let loaded = load_records(store.as_ref()).await.unwrap();
        assert!(loaded[0].filename.contains("20240301"));
        assert!(loaded[1].filename.contains("20240101"));
    }

    #[tokio::test]
    async fn test_index_falls_back_to_pack_listing() {
        let store = setup_test_store();
        store
            .commit(
                vec![
                    Op::add_bytes("packs/pack_b.zip", vec![0; 10]),
                    Op::add_bytes("packs/pack_a.zip", vec![0; 4]),
                    Op::add_bytes("packs/notes.txt", b"not a pack".to_vec()),
                ],
                "seed",
            )
            .await
            .unwrap();

        let index = load_index(store.as_ref()).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].filename, "pack_a.zip");
        assert_eq!(index[0].size, 4);

        // once saved, the file wins over the listing
        store.commit(vec![save_index_op(index)], "state").await.unwrap();
        let reloaded = load_index(store.as_ref()).await.unwrap();
        assert_eq!(reloaded[0].filename, "pack_b.zip");
    }
}
