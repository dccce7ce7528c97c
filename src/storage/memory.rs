use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{Result, StoreError};
use super::traits::{CommitOp, MirrorStore};

/// In-memory mirror used by tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MirrorStore for MemoryStore {
    async fn ensure_repository(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn size(&self, path: &str) -> Result<u64> {
        Ok(self.read(path).await?.len() as u64)
    }

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()> {
        let bytes = self.read(path).await?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, bytes)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .keys()
            .filter(|k| {
                prefix.is_empty() || k.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
            })
            .cloned()
            .collect())
    }

    async fn commit(&self, ops: Vec<CommitOp>, _message: &str) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        for op in ops {
            match op {
                CommitOp::Add { path, source } => {
                    files.insert(path, std::fs::read(&source)?);
                }
                CommitOp::AddBytes { path, bytes } => {
                    files.insert(path, bytes);
                }
                CommitOp::Copy { src, dest } => {
                    let bytes =
                        files.get(&src).cloned().ok_or(StoreError::NotFound(src))?;
                    files.insert(dest, bytes);
                }
                CommitOp::Delete { path } => {
                    files.remove(&path).ok_or(StoreError::NotFound(path))?;
                }
            }
        }
        Ok(())
    }

    fn file_url(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}
