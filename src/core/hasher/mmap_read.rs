//! Memory-mapped reads for hashing large files.
//!
//! Files at or above [`MMAP_THRESHOLD`] are mapped and hashed in one pass;
//! smaller ones are streamed through a fixed buffer, where the mapping
//! overhead is not worth it.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

const STREAM_BUFFER: usize = 64 * 1024;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> HashError + '_ {
    move |source| HashError::IoError {
        path: path.to_path_buf(),
        source,
    }
}

/// Feed the whole content of `path` into `hasher`.
pub fn update_from_file(hasher: &mut blake3::Hasher, path: &Path) -> Result<(), HashError> {
    let file = File::open(path).map_err(io_error(path))?;
    let len = file.metadata().map_err(io_error(path))?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and dropped before `file`. A concurrent
        // writer can change what we hash but cannot make the read unsound for
        // a plain byte slice.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error(path))?;
        hasher.update(&mmap);
        return Ok(());
    }

    let mut reader = BufReader::new(file);
    let mut buffer = vec![0u8; STREAM_BUFFER];
    loop {
        let read = reader.read(&mut buffer).map_err(io_error(path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(())
}
