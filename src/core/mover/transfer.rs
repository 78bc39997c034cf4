//! No-clobber file transfer.
//!
//! Order of attempts:
//! 1. hard link + unlink: atomic refusal if the destination appeared since planning
//! 2. rename, after re-checking the destination (filesystems without hard links)
//! 3. copy into a freshly created file, verify the size, then unlink the source
//!    (cross-device moves)

use super::ledger::exists_on_disk;
use crate::error::MoveError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;
use tracing::{debug, warn};

pub(super) fn move_no_clobber(from: &Path, to: &Path) -> Result<(), MoveError> {
    match fs::hard_link(from, to) {
        Ok(()) => return unlink_source(from, to),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MoveError::DestinationExists {
                path: to.to_path_buf(),
            });
        }
        Err(e) => {
            debug!(from = %from.display(), error = %e, "hard link unavailable, renaming");
        }
    }

    if exists_on_disk(to) {
        return Err(MoveError::DestinationExists {
            path: to.to_path_buf(),
        });
    }

    let rename_error = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    warn!(
        from = %from.display(),
        to = %to.display(),
        error = %rename_error,
        "rename failed, falling back to copy"
    );
    copy_then_remove(from, to).map_err(|err| match err {
        CopyFailure::Exists => MoveError::DestinationExists {
            path: to.to_path_buf(),
        },
        CopyFailure::Io(copy_error) => {
            warn!(from = %from.display(), error = %copy_error, "copy fallback failed");
            MoveError::Rename {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: rename_error,
            }
        }
        CopyFailure::Verify(e) => e,
    })
}

/// The link is in place; drop the source name, or undo the link if we can't.
fn unlink_source(from: &Path, to: &Path) -> Result<(), MoveError> {
    if let Err(source) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(MoveError::Delete {
            path: from.to_path_buf(),
            source,
        });
    }
    Ok(())
}

enum CopyFailure {
    Exists,
    Io(io::Error),
    Verify(MoveError),
}

impl From<io::Error> for CopyFailure {
    fn from(e: io::Error) -> Self {
        if e.kind() == ErrorKind::AlreadyExists {
            CopyFailure::Exists
        } else {
            CopyFailure::Io(e)
        }
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> Result<(), CopyFailure> {
    let mut source = File::open(from)?;
    let expected = source.metadata()?.len();

    let mut dest = OpenOptions::new().write(true).create_new(true).open(to)?;
    let copied = io::copy(&mut source, &mut dest).and_then(|n| dest.sync_all().map(|_| n));
    drop(dest);

    let actual = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(to);
            return Err(CopyFailure::Io(e));
        }
    };
    if actual != expected {
        let _ = fs::remove_file(to);
        return Err(CopyFailure::Verify(MoveError::CopyVerification {
            path: from.to_path_buf(),
            expected,
            actual,
        }));
    }

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(CopyFailure::Io(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn moves_content() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.jpg");
        let to = temp.path().join("b.jpg");
        fs::write(&from, b"content").unwrap();

        move_no_clobber(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"content");
    }

    #[test]
    fn refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.jpg");
        let to = temp.path().join("b.jpg");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        let result = move_no_clobber(&from, &to);

        assert!(matches!(result, Err(MoveError::DestinationExists { .. })));
        assert_eq!(fs::read(&to).unwrap(), b"old");
        assert!(from.exists());
    }

    #[test]
    fn copy_fallback_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.jpg");
        let to = temp.path().join("b.jpg");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        assert!(matches!(
            copy_then_remove(&from, &to),
            Err(CopyFailure::Exists)
        ));
        assert_eq!(fs::read(&to).unwrap(), b"old");
    }

    #[test]
    fn copy_fallback_moves_content() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.jpg");
        let to = temp.path().join("b.jpg");
        fs::write(&from, b"payload").unwrap();

        assert!(copy_then_remove(&from, &to).is_ok());
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"payload");
    }
}
