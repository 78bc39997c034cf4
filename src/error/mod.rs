//! # Error Module
//!
//! Error types for media-tidy.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every per-file error names the file
//! - **Recover locally** - date, stat and hash failures are logged and the file
//!   is skipped; only configuration errors stop a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Move error: {0}")]
    Move(#[from] MoveError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while enumerating files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a content digest
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path} for hashing: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a single move, rename or delete
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: source {expected} bytes, destination {actual} bytes")]
    CopyVerification {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MoveError {
    /// The file this error is about
    pub fn path(&self) -> &PathBuf {
        match self {
            MoveError::DestinationExists { path }
            | MoveError::SourceMissing { path }
            | MoveError::CopyVerification { path, .. }
            | MoveError::Delete { path, .. }
            | MoveError::CreateDir { path, .. } => path,
            MoveError::Rename { from, .. } => from,
        }
    }
}

/// Fatal errors detected before any scan begins
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Directory does not exist: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("Invalid quarantine directory name {name:?}: must be a single path component")]
    InvalidQuarantineName { name: String },

    #[error("Failed to resolve {path}: {source}")]
    ResolveRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TidyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/memories/export"),
        };
        assert!(error.to_string().contains("/memories/export"));
    }

    #[test]
    fn move_error_reports_offending_path() {
        let error = MoveError::Rename {
            from: PathBuf::from("/memories/a.jpg"),
            to: PathBuf::from("/memories/b.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.path(), &PathBuf::from("/memories/a.jpg"));
        let message = error.to_string();
        assert!(message.contains("/memories/a.jpg"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn config_error_wraps_into_top_level() {
        let error: TidyError = ConfigError::RootNotFound {
            path: PathBuf::from("/missing"),
        }
        .into();
        assert!(error.to_string().starts_with("Configuration error"));
    }
}
