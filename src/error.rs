use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = GachaError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GachaError {
    #[error("invalid pack quantity {input:?}: must be a whole number of at least 1")]
    InvalidPurchaseQuantity { input: String },
    #[error("failed to access player record at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("player record at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to serialize player record")]
    Serialize(#[source] serde_json::Error),
}

impl GachaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GachaError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GachaError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures at the storage boundary, which abort the action in
    /// progress.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            GachaError::Io { .. } | GachaError::Corrupt { .. } | GachaError::Serialize(_)
        )
    }
}
