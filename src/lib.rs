//! # Media Tidy
//!
//! Reorganizes an exported tree of photos and videos: dates every file,
//! quarantines byte-identical copies and normalizes names.
//!
//! ## Core Philosophy
//! - **Dry-run first** - Nothing changes on disk unless explicitly asked
//! - **Never clobber** - A name collision yields a new name, not an overwrite
//! - **Reproducible** - The same tree always produces the same plan
//!
//! ## Architecture
//! - `core` - Date resolution, duplicate detection and the collision-safe mover
//! - `events` - Event-driven progress reporting
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, TidyError};

/// Initialize tracing for the binary.
///
/// `RUST_LOG` takes precedence; otherwise `warn`, or `debug` when `verbose`.
/// Logs go to stderr so they never mix with JSON output.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
