//! Error handling for column store and file operations.

use std::io;
use std::path::PathBuf;
use std::result;

use crate::columnar::schema::DataType;

/// A specialized `Result` type for database operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while building, reading, saving or loading a database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A column with this name already exists.
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    /// The numeric type tag does not name a supported data type.
    #[error("invalid data type tag: {0}")]
    InvalidType(u8),

    /// No column with this name exists.
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    /// The value's type is not accepted by the column.
    #[error("type mismatch for column '{column}': expected {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    /// The byte stream is not a well-formed database file.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// The file to load does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptData(msg.into())
    }
}
