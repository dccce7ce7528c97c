use tracing::info;

use crate::errors::MirrorError;
use crate::models::IndexRecord;
use crate::pack::merge_zips;
use crate::repo::readme::render_repack_readme;
use crate::repo::record_repo::{load_index, save_index_op};
use crate::repo::{ARCHIVED_DIR, PACKS_DIR, README_FILE, UNARCHIVED_DIR};
use crate::storage::{CommitOp, MirrorStore};

use super::timestamp_slug;

/// Folds every `unarchived/` resource archive into one merged pack
///
/// The merged pack, the `archived/` copies, the deletions of the sources,
/// the rebuilt index and the README all land in a single commit. Returns
/// the new pack's name, or `None` when there was nothing to repack.
pub async fn repack_all(store: &dyn MirrorStore) -> Result<Option<String>, MirrorError> {
    let sources: Vec<String> = store
        .list(UNARCHIVED_DIR)
        .await?
        .into_iter()
        .filter(|path| path.ends_with(".zip"))
        .collect();
    if sources.is_empty() {
        info!("no files to repack, skipped");
        return Ok(None);
    }

    let scratch = tempfile::tempdir()?;
    let mut local_zips = Vec::new();
    for (i, path) in sources.iter().enumerate() {
        let local = scratch.path().join(format!("source_{i}.zip"));
        store.download_to(path, &local).await?;
        local_zips.push(local);
    }

    let merged = scratch.path().join("package.zip");
    let Some(entries) = merge_zips(&local_zips, &merged)? else {
        info!("source archives are all empty, skipped");
        return Ok(None);
    };

    let pack_name = format!("pack_{}.zip", timestamp_slug());
    info!(pack = %pack_name, sources = sources.len(), entries, "creating new pack");

    let mut ops = vec![CommitOp::add(format!("{PACKS_DIR}/{pack_name}"), &merged)];
    for source in &sources {
        let filename = source.rsplit('/').next().unwrap_or(source);
        ops.push(CommitOp::copy(source.clone(), format!("{ARCHIVED_DIR}/{filename}")));
        ops.push(CommitOp::delete(source.clone()));
    }

    let mut index = load_index(store).await?;
    index.push(IndexRecord { filename: pack_name.clone(), size: std::fs::metadata(&merged)?.len() });
    index.sort_by(|a, b| b.filename.cmp(&a.filename));
    let readme = render_repack_readme(store, &index);
    ops.push(save_index_op(index));
    ops.push(CommitOp::add_bytes(README_FILE, readme.into_bytes()));

    store.commit(ops, &format!("Create new package {pack_name:?}.")).await?;
    Ok(Some(pack_name))
}
