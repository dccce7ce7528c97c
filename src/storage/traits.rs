use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::Result;

/// One operation inside a store commit
///
/// A commit is the unit in which the mirror changes: a crawl run lands its
/// pack and every state file together, and a repack moves its sources to
/// `archived/` in the same commit that adds the merged pack.
#[derive(Debug, Clone)]
pub enum CommitOp {
    /// Upload a local file to `path`
    Add { path: String, source: PathBuf },

    /// Write an in-memory buffer to `path`
    AddBytes { path: String, bytes: Vec<u8> },

    /// Copy an existing stored file
    Copy { src: String, dest: String },

    /// Delete a stored file
    Delete { path: String },
}

impl CommitOp {
    pub fn add(path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self::Add { path: path.into(), source: source.into() }
    }

    pub fn add_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::AddBytes { path: path.into(), bytes }
    }

    pub fn copy(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::Copy { src: src.into(), dest: dest.into() }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::Delete { path: path.into() }
    }
}

/// A storage medium the mirror can live on
///
/// Paths are repo-relative, `/`-separated, and never start with `/`.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Creates the mirror target if it does not exist yet
    async fn ensure_repository(&self) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Size in bytes of a stored file
    async fn size(&self, path: &str) -> Result<u64>;

    /// Saves a stored file to a local path
    async fn download_to(&self, path: &str, dest: &Path) -> Result<()>;

    /// Lists stored file paths under `prefix`, recursively; an empty prefix
    /// lists the whole mirror. A missing prefix is an empty listing, not an
    /// error.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Applies all operations as one commit
    async fn commit(&self, ops: Vec<CommitOp>, message: &str) -> Result<()>;

    /// A stable URL for linking to a stored file
    fn file_url(&self, path: &str) -> String;

    async fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.read(path).await?;
        String::from_utf8(bytes)
            .map_err(|e| super::error::StoreError::Malformed(format!("{path}: {e}")))
    }

    async fn write_text(&self, path: &str, text: &str, message: &str) -> Result<()> {
        self.commit(vec![CommitOp::add_bytes(path, text.as_bytes().to_vec())], message).await
    }

    async fn upload_file(&self, source: &Path, path: &str, message: &str) -> Result<()> {
        self.commit(vec![CommitOp::add(path, source)], message).await
    }
}
