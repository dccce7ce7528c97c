use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use walkdir::WalkDir;

use super::error::{Result, StoreError};
use super::traits::{CommitOp, MirrorStore};

/// A mirror rooted in a local directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for LocalStore {
    async fn ensure_repository(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.abs(path)).await?)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        match fs::read(self.abs(path)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> Result<u64> {
        match fs::metadata(self.abs(path)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()> {
        if !self.exists(path).await? {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(self.abs(path), dest).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let base = if prefix.is_empty() { self.root.clone() } else { self.abs(prefix) };
        if !base.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                StoreError::Malformed(format!("walking {}: {e}", base.display()))
            })?;
            if entry.file_type().is_file() {
                let rel = entry
                    .path()
                    .strip_prefix(&self.root)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                paths.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(paths)
    }

    async fn commit(&self, ops: Vec<CommitOp>, _message: &str) -> Result<()> {
        for op in ops {
            match op {
                CommitOp::Add { path, source } => {
                    let dest = self.abs(&path);
                    self.ensure_parent(&dest).await?;
                    fs::copy(&source, &dest).await?;
                }
                CommitOp::AddBytes { path, bytes } => {
                    let dest = self.abs(&path);
                    self.ensure_parent(&dest).await?;
                    fs::write(&dest, &bytes).await?;
                }
                CommitOp::Copy { src, dest } => {
                    if !self.exists(&src).await? {
                        return Err(StoreError::NotFound(src));
                    }
                    let dest_abs = self.abs(&dest);
                    self.ensure_parent(&dest_abs).await?;
                    fs::copy(self.abs(&src), &dest_abs).await?;
                }
                CommitOp::Delete { path } => {
                    if !self.exists(&path).await? {
                        return Err(StoreError::NotFound(path));
                    }
                    fs::remove_file(self.abs(&path)).await?;
                }
            }
        }
        Ok(())
    }

    fn file_url(&self, path: &str) -> String {
        self.abs(path).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.ensure_repository().await.unwrap();

        store.write_text("a/b.txt", "hello", "add b").await.unwrap();
        assert!(store.exists("a/b.txt").await.unwrap());
        assert_eq!(store.read_text("a/b.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.ensure_repository().await.unwrap();

        let err = store.read("missing.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_recursive_and_relative() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.ensure_repository().await.unwrap();

        store.write_text("unarchived/a.zip", "x", "a").await.unwrap();
        store.write_text("unarchived/b.zip", "y", "b").await.unwrap();
        store.write_text("packs/pack_1.zip", "z", "c").await.unwrap();

        let listed = store.list("unarchived").await.unwrap();
        assert_eq!(listed, vec!["unarchived/a.zip", "unarchived/b.zip"]);

        let all = store.list("").await.unwrap();
        assert_eq!(all.len(), 3);

        assert!(store.list("nonexistent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_copy_and_delete() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.ensure_repository().await.unwrap();

        store.write_text("unarchived/a.zip", "data", "seed").await.unwrap();
        store
            .commit(
                vec![
                    CommitOp::copy("unarchived/a.zip", "archived/a.zip"),
                    CommitOp::delete("unarchived/a.zip"),
                ],
                "archive a",
            )
            .await
            .unwrap();

        assert!(!store.exists("unarchived/a.zip").await.unwrap());
        assert_eq!(store.read_text("archived/a.zip").await.unwrap(), "data");
    }
}
