/// Errors that can occur within the storage layer.
///
/// A write failure is recoverable per sample (the sampler records it and
/// continues the batch); a read failure is surfaced to the trend/history
/// caller as an explicit error, distinct from "no data".
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not create or access the database directory.
    #[error("storage: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
