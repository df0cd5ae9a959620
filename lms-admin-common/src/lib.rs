//! Common types and utilities shared by the LMS admin panels

pub mod backup;
pub mod format;
pub mod trash;

pub use backup::{BackupListItem, BackupLocator, BackupRecord, RetentionLocation};
pub use trash::{EntityType, TrashRecord, TrashTab, RETENTION_DAYS};

/// Admin console error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Trash record not found: {0}")]
    TrashRecordNotFound(String),

    #[error("Backup '{0}' has no stored file to restore from")]
    MissingLocator(String),

    #[error("Backup '{0}' is only stored on this device and cannot be restored by the server")]
    SessionLocator(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown {kind}: {value}")]
    UnknownTag { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
