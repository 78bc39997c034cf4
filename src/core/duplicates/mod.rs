//! # Duplicates Module
//!
//! Exact duplicate detection in two phases.
//!
//! ## Phases
//! 1. **Size** - stat every file and bucket by byte size. A file whose size
//!    is unique cannot have a duplicate and is never read.
//! 2. **Content** - hash every member of every bucket with two or more
//!    entries, then group each bucket by digest.
//!
//! Within a digest group the file with the lexicographically smallest path
//! (byte-wise, independent of locale) is the original; every other member
//! is a duplicate of it.
//!
//! ## Parallelism
//! Hashing runs on a rayon pool bounded by `hash_threads`. Everything after
//! hashing is single-threaded.

mod quarantine;

pub use quarantine::{plan_quarantine, plan_quarantine_with};

use crate::core::cancel::CancellationToken;
use crate::core::config::TidyConfig;
use crate::core::hasher::{hash_file, ContentDigest};
use crate::core::mover::PendingChanges;
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::TidyError;
use crate::events::{null_sender, Event, EventSender, HashEvent, HashProgress};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// One enumerated file. Owned by the scan that created it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    /// Filled in only for files that shared their size with another
    pub content_hash: Option<ContentDigest>,
    pub resolved_date: Option<DateTime<Utc>>,
}

/// Byte-identical files, with the one that is kept
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub digest: ContentDigest,
    pub size: u64,
    /// Lexicographically first member
    pub original: PathBuf,
    /// Every other member, in path order
    pub duplicates: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes freed by removing every duplicate
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size.saturating_mul(self.duplicates.len() as u64)
    }
}

/// Counters describing one detection run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateStats {
    /// Files enumerated and successfully stat'ed
    pub files_scanned: usize,
    /// Files whose content was hashed
    pub candidates_hashed: usize,
    /// Files ruled out by a unique size, never read
    pub skipped_by_size: usize,
    /// Stat and hash failures (files excluded)
    pub errors: usize,
}

/// Outcome of [`DuplicateDetector::find_duplicates`]
#[derive(Debug, Default)]
pub struct DuplicateScan {
    pub root: PathBuf,
    pub records: Vec<FileRecord>,
    pub groups: Vec<DuplicateGroup>,
    pub stats: DuplicateStats,
    /// Set when hashing was interrupted; `groups` is then empty
    pub cancelled: bool,
}

impl DuplicateScan {
    /// Every duplicate across all groups
    pub fn duplicates(&self) -> Vec<&Path> {
        self.groups
            .iter()
            .flat_map(|g| g.duplicates.iter().map(PathBuf::as_path))
            .collect()
    }

    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates.len()).sum()
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable_bytes).sum()
    }
}

/// Finds files whose content duplicates an earlier file's
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    scan_config: ScanConfig,
    hash_threads: usize,
    cancel: CancellationToken,
}

impl DuplicateDetector {
    /// Detector for `config`: recursive, skipping the quarantine directory
    pub fn new(config: &TidyConfig) -> Self {
        let scan_config = ScanConfig::recursive()
            .excluding(config.quarantine_dir())
            .with_hidden(config.include_hidden)
            .with_symlinks(config.follow_symlinks);
        Self {
            scan_config,
            hash_threads: config.hash_threads,
            cancel: config.cancel.clone(),
        }
    }

    pub fn find_duplicates(&self, root: &Path) -> Result<DuplicateScan, TidyError> {
        self.find_duplicates_with_events(root, &null_sender())
    }

    pub fn find_duplicates_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<DuplicateScan, TidyError> {
        self.find_duplicates_pending(root, &PendingChanges::new(), events)
    }

    /// Detect duplicates in the tree `pending` would leave behind. Records
    /// and groups carry the would-be paths; bytes are read where they are now.
    pub fn find_duplicates_pending(
        &self,
        root: &Path,
        pending: &PendingChanges,
        events: &EventSender,
    ) -> Result<DuplicateScan, TidyError> {
        let scanner = WalkDirScanner::new(self.scan_config.clone());
        let scanned = scanner.scan_with_events(root, events)?;
        let files = pending.overlay(scanned.files, |p| {
            p.starts_with(root) && !self.scan_config.exclude_dirs.iter().any(|d| p.starts_with(d))
        });

        let mut scan = DuplicateScan {
            root: root.to_path_buf(),
            ..Default::default()
        };
        scan.stats.errors = scanned.errors.len();

        // Phase 1: stat and bucket by size
        for path in files {
            match fs::metadata(pending.content_path(&path)) {
                Ok(meta) => scan.records.push(FileRecord {
                    path,
                    size: meta.len(),
                    content_hash: None,
                    resolved_date: None,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot stat file, skipping");
                    scan.stats.errors += 1;
                }
            }
        }
        scan.stats.files_scanned = scan.records.len();

        let buckets = size_buckets(&scan.records);
        let candidates: Vec<usize> = buckets
            .values()
            .filter(|members| members.len() >= 2)
            .flatten()
            .copied()
            .collect();
        scan.stats.skipped_by_size = scan.records.len() - candidates.len();
        debug!(
            files = scan.records.len(),
            candidates = candidates.len(),
            "size bucketing done"
        );

        // Phase 2: hash candidates
        let hashed = self.hash_candidates(&scan.records, &candidates, pending, events);
        for (idx, result) in hashed {
            match result {
                Some(digest) => {
                    scan.records[idx].content_hash = Some(digest);
                    scan.stats.candidates_hashed += 1;
                }
                None => scan.stats.errors += 1,
            }
        }

        if self.cancel.is_cancelled() {
            warn!("duplicate detection cancelled during hashing");
            scan.cancelled = true;
            return Ok(scan);
        }

        // Phase 3: group by digest within each bucket
        for (size, members) in &buckets {
            if members.len() < 2 {
                continue;
            }
            scan.groups
                .extend(digest_groups(&scan.records, members, *size));
        }
        scan.groups
            .sort_by(|a, b| compare_paths(&a.original, &b.original));

        Ok(scan)
    }

    /// Hash `candidates`; `None` marks a failed file. Skipped files (after
    /// cancellation) are left out entirely.
    fn hash_candidates(
        &self,
        records: &[FileRecord],
        candidates: &[usize],
        pending: &PendingChanges,
        events: &EventSender,
    ) -> Vec<(usize, Option<ContentDigest>)> {
        let total = candidates.len();
        events.send(Event::Hash(HashEvent::Started { total_files: total }));

        let completed = AtomicUsize::new(0);
        let work = || {
            candidates
                .par_iter()
                .filter_map(|&idx| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let path = &records[idx].path;
                    let result = match hash_file(pending.content_path(path)) {
                        Ok(digest) => Some(digest),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "cannot hash file, skipping");
                            events.send(Event::Hash(HashEvent::Error {
                                path: path.clone(),
                                message: e.to_string(),
                            }));
                            None
                        }
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.send(Event::Hash(HashEvent::Progress(HashProgress {
                        completed: done,
                        total,
                        current_path: path.clone(),
                    })));
                    Some((idx, result))
                })
                .collect::<Vec<_>>()
        };

        let results = match self.thread_pool() {
            Some(pool) => pool.install(work),
            None => work(),
        };

        events.send(Event::Hash(HashEvent::Completed {
            total_hashed: results.iter().filter(|(_, r)| r.is_some()).count(),
        }));
        results
    }

    /// Dedicated pool when a thread count is configured; the global pool otherwise
    fn thread_pool(&self) -> Option<rayon::ThreadPool> {
        if self.hash_threads == 0 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.hash_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "cannot build hashing pool, using the global pool");
                None
            }
        }
    }
}

/// Size -> arena indices, in scan order
fn size_buckets(records: &[FileRecord]) -> HashMap<u64, Vec<usize>> {
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        buckets.entry(record.size).or_default().push(idx);
    }
    buckets
}

fn digest_groups(records: &[FileRecord], members: &[usize], size: u64) -> Vec<DuplicateGroup> {
    let mut by_digest: BTreeMap<ContentDigest, Vec<&Path>> = BTreeMap::new();
    for &idx in members {
        if let Some(digest) = records[idx].content_hash {
            by_digest
                .entry(digest)
                .or_default()
                .push(&records[idx].path);
        }
    }

    by_digest
        .into_iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .map(|(digest, mut paths)| {
            paths.sort_by(|a, b| compare_paths(a, b));
            let original = paths[0].to_path_buf();
            let duplicates = paths[1..].iter().map(|p| p.to_path_buf()).collect();
            DuplicateGroup {
                digest,
                size,
                original,
                duplicates,
            }
        })
        .collect()
}

/// Byte-wise path order
pub(crate) fn compare_paths(a: &Path, b: &Path) -> CmpOrdering {
    a.as_os_str()
        .as_encoded_bytes()
        .cmp(b.as_os_str().as_encoded_bytes())
}
