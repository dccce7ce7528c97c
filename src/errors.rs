use thiserror::Error;

use crate::client::ClientError;
use crate::pack::PackError;
use crate::storage::StoreError;

/// Top-level error for mirror jobs
///
/// Module boundaries keep their own typed errors; this is the sum the jobs
/// and the CLI deal in.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("site api: {0}")]
    Client(#[from] ClientError),

    #[error("storage: {0}")]
    Store(#[from] StoreError),

    #[error("packaging: {0}")]
    Pack(#[from] PackError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
