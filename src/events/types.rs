//! Event type definitions for progress reporting.

use crate::core::operations::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while planning or applying an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Enumeration events
    Scan(ScanEvent),
    /// Content hashing events
    Hash(HashEvent),
    /// Plan application events
    Apply(ApplyEvent),
}

/// Events during directory enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A file was found
    FileFound { path: PathBuf },
    /// An entry could not be read but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events during the hashing phase of duplicate detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started for every file that shares its size with another
    Started { total_files: usize },
    /// Progress update during hashing
    Progress(HashProgress),
    /// A file could not be hashed and is excluded
    Error { path: PathBuf, message: String },
    /// Hashing completed
    Completed { total_hashed: usize },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of files hashed so far
    pub completed: usize,
    /// Total number of files to hash
    pub total: usize,
    /// File just hashed
    pub current_path: PathBuf,
}

/// Events while applying a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApplyEvent {
    /// Application has started
    Started {
        operation: OperationKind,
        total: usize,
        dry_run: bool,
    },
    /// One action finished (successfully or not)
    Progress(ApplyProgress),
    /// An action failed; the batch continues
    Failed { path: PathBuf, message: String },
    /// Application completed
    Completed {
        operation: OperationKind,
        succeeded: usize,
        attempted: usize,
    },
}

/// Progress information while applying a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyProgress {
    /// Actions processed so far
    pub completed: usize,
    /// Total actions in the plan
    pub total: usize,
    /// Source path of the action just processed
    pub current_path: PathBuf,
}
