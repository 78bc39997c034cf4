//! Run configuration.
//!
//! Built once per invocation through [`TidyConfigBuilder`]; `build()` performs
//! every check that must fail before a scan begins.

use super::cancel::CancellationToken;
use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Default name of the subdirectory duplicates are moved into
pub const DEFAULT_QUARANTINE_DIR: &str = "duplicates";

/// Validated configuration shared by every operation of a run
#[derive(Debug, Clone)]
pub struct TidyConfig {
    /// Absolute directory being tidied
    pub root: PathBuf,
    /// When set, operations plan and report but never touch the filesystem
    pub dry_run: bool,
    /// Quarantine subdirectory name, relative to `root`
    pub quarantine_dir_name: String,
    /// Include dot-files and dot-directories
    pub include_hidden: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Worker threads for content hashing (0 = rayon default)
    pub hash_threads: usize,
    /// Additional directories searched for overlay files
    pub extra_overlay_dirs: Vec<PathBuf>,
    /// Stop signal for long-running work
    pub cancel: CancellationToken,
}

impl TidyConfig {
    /// Start building a configuration for `root`
    pub fn builder(root: impl Into<PathBuf>) -> TidyConfigBuilder {
        TidyConfigBuilder::new(root)
    }

    /// Absolute path of the quarantine directory
    pub fn quarantine_dir(&self) -> PathBuf {
        self.root.join(&self.quarantine_dir_name)
    }
}

/// Builder for [`TidyConfig`]
#[derive(Debug)]
pub struct TidyConfigBuilder {
    root: PathBuf,
    dry_run: bool,
    quarantine_dir_name: String,
    include_hidden: bool,
    follow_symlinks: bool,
    hash_threads: usize,
    extra_overlay_dirs: Vec<PathBuf>,
    cancel: CancellationToken,
}

impl TidyConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: true,
            quarantine_dir_name: DEFAULT_QUARANTINE_DIR.to_string(),
            include_hidden: false,
            follow_symlinks: false,
            hash_threads: 0,
            extra_overlay_dirs: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Enable or disable dry-run (enabled by default)
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use a different quarantine subdirectory name
    pub fn quarantine_dir_name(mut self, name: impl Into<String>) -> Self {
        self.quarantine_dir_name = name.into();
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Cap the hashing pool size
    pub fn hash_threads(mut self, threads: usize) -> Self {
        self.hash_threads = threads;
        self
    }

    /// Also look for overlays in `dir`
    pub fn extra_overlay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_overlay_dirs.push(dir.into());
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<TidyConfig, ConfigError> {
        let root = std::path::absolute(&self.root).map_err(|source| ConfigError::ResolveRoot {
            path: self.root.clone(),
            source,
        })?;

        if !root.exists() {
            return Err(ConfigError::RootNotFound { path: root });
        }
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory { path: root });
        }
        if !is_single_component(&self.quarantine_dir_name) {
            return Err(ConfigError::InvalidQuarantineName {
                name: self.quarantine_dir_name,
            });
        }

        Ok(TidyConfig {
            root,
            dry_run: self.dry_run,
            quarantine_dir_name: self.quarantine_dir_name,
            include_hidden: self.include_hidden,
            follow_symlinks: self.follow_symlinks,
            hash_threads: self.hash_threads,
            extra_overlay_dirs: self.extra_overlay_dirs,
            cancel: self.cancel,
        })
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
