use callsheet_core::CoreError;
use callsheet_store::error::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Malformed JSON input. Write-side failures surface as `Io` or `Backup`.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("input {path} is {size} bytes, limit is {limit}")]
    InputTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("backup failed at {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("contact store error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    /// Bad input, plan or configuration; nothing was mutated.
    InvalidInput,
    /// The store could not be read or written.
    Store,
    Io,
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::Core(_)
            | ImportError::Csv(_)
            | ImportError::Json(_)
            | ImportError::Parse(_)
            | ImportError::InputTooLarge { .. }
            | ImportError::InvalidPlan(_) => ImportErrorKind::InvalidInput,
            ImportError::Store(_) | ImportError::Backend(_) => ImportErrorKind::Store,
            ImportError::Io(_) | ImportError::Backup { .. } => ImportErrorKind::Io,
        }
    }
}
