//! Error types for delimited-text ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a delimited file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file.
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Failed to open or read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Decoding Errors ===
    /// Bytes are not valid under the configured encoding.
    #[error("invalid {encoding} data in {path} at line {line}")]
    Decoding {
        path: PathBuf,
        encoding: &'static str,
        line: usize,
    },

    /// Encoding label is not recognized.
    #[error("unknown encoding label '{label}'")]
    UnknownEncoding { label: String },

    // === Structure Errors ===
    /// File has no header line.
    #[error("file is empty: {path}")]
    EmptyFile { path: PathBuf },

    /// Header contains the same column name twice.
    #[error("duplicate column '{column}' in header of {path}")]
    DuplicateColumn { path: PathBuf, column: String },

    /// Row field count differs from the header (strict mode only).
    #[error("malformed row in {path} at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Quoted field still open at end of file (strict mode only).
    #[error("unterminated quoted field in {path} starting at line {line}")]
    UnterminatedQuote { path: PathBuf, line: usize },

    // === Argument Errors ===
    /// Caller supplied an unusable argument.
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

/// Coarse error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileAccess,
    Decoding,
    MalformedRow,
    EmptyFile,
    DuplicateColumn,
    InvalidArgument,
}

impl IngestError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } | Self::NotAFile { .. } | Self::FileRead { .. } => {
                ErrorKind::FileAccess
            }
            Self::Decoding { .. } | Self::UnknownEncoding { .. } => ErrorKind::Decoding,
            Self::MalformedRow { .. } | Self::UnterminatedQuote { .. } => ErrorKind::MalformedRow,
            Self::EmptyFile { .. } => ErrorKind::EmptyFile,
            Self::DuplicateColumn { .. } => ErrorKind::DuplicateColumn,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Maps an I/O error on `path` to `FileNotFound` or `FileRead`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source: err }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /path/to/file.csv");
    }

    #[test]
    fn test_malformed_row_cites_line() {
        let err = IngestError::MalformedRow {
            path: PathBuf::from("people.csv"),
            line: 4,
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "malformed row in people.csv at line 4: expected 3 fields, found 2"
        );
        assert_eq!(err.kind(), ErrorKind::MalformedRow);
    }

    #[test]
    fn test_from_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = IngestError::from_io("missing.csv", io);
        assert!(matches!(err, IngestError::FileNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[test]
    fn test_from_io_other() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = IngestError::from_io("locked.csv", io);
        assert!(matches!(err, IngestError::FileRead { .. }));
    }
}
