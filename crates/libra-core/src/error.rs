//! Error types for all LibraDB operations.

use std::io;
use thiserror::Error;

/// Top-level error type for LibraDB operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Tx(#[from] TxError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("key exceeds maximum size of {max} bytes (got {actual})")]
    KeyTooLarge { max: usize, actual: usize },

    #[error("value exceeds maximum size of {max} bytes (got {actual})")]
    ValueTooLarge { max: usize, actual: usize },

    #[error("corrupted collection record: {0}")]
    CorruptedRecord(String),
}

#[derive(Debug, Error)]
pub enum TxError {
    #[error("can't perform a write operation inside a read transaction")]
    WriteInsideReadTx,
}

pub type Result<T> = std::result::Result<T, Error>;
