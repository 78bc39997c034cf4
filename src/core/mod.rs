//! # Core Module
//!
//! The UI-agnostic tidy engine.
//!
//! ## Modules
//! - `scanner` - Enumerates files under a root
//! - `date` - Resolves a file's canonical date
//! - `hasher` - Full-content BLAKE3 digests
//! - `duplicates` - Size-then-content duplicate detection
//! - `mover` - Collision-safe move, rename and delete
//! - `operations` - Plans and applies the user-facing operations
//! - `config` - Validated run configuration
//! - `cancel` - Cooperative cancellation

pub mod cancel;
pub mod config;
pub mod date;
pub mod duplicates;
pub mod hasher;
pub mod mover;
pub mod operations;
pub mod scanner;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::{TidyConfig, TidyConfigBuilder, DEFAULT_QUARANTINE_DIR};
pub use date::{DateResolver, DateSource, ResolvedDate};
pub use duplicates::{DuplicateDetector, DuplicateGroup, DuplicateScan};
pub use mover::{PendingChanges, RenamePlan, SuffixStyle};
pub use operations::{apply_plan, OperationKind, OperationPlan, OperationReport, PlannedAction};
