//! Chunked file operations for the mounted backend
//!
//! Plain buffered `std::fs` I/O: the mount under test does its own caching
//! and flushing, so nothing here bypasses the page cache or forces a sync.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request for a copy or drain running on another thread.
/// Checked between chunks.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> io::Result<()> {
        if self.is_raised() {
            Err(io::Error::new(io::ErrorKind::Interrupted, "aborted"))
        } else {
            Ok(())
        }
    }
}

/// Remove `path` if it exists.
///
/// Always succeeds: a failed removal is ignored and the following write
/// truncates the file anyway.
pub fn delete_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "ignoring failed delete");
        }
    }
}

/// Copy `src` to `dest` in `chunk_size` pieces, truncating `dest`.
/// Returns the number of bytes written. Stops with `Interrupted` once
/// `abort` is raised.
pub fn copy_chunked(
    src: &Path,
    dest: &Path,
    chunk_size: usize,
    abort: &AbortFlag,
) -> io::Result<u64> {
    let mut reader = File::open(src)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)?;

    let mut buffer = vec![0u8; chunk_size];
    let mut written = 0u64;
    loop {
        abort.check()?;
        let n = read_chunk(&mut reader, &mut buffer)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
        written += n as u64;
    }
    writer.flush()?;
    Ok(written)
}

/// Read `path` to the end in `chunk_size` pieces, discarding the data.
/// Returns the number of bytes read.
pub fn drain_chunked(path: &Path, chunk_size: usize, abort: &AbortFlag) -> io::Result<u64> {
    let mut reader = File::open(path)?;
    let mut buffer = vec![0u8; chunk_size];
    let mut read = 0u64;
    loop {
        abort.check()?;
        let n = read_chunk(&mut reader, &mut buffer)?;
        if n == 0 {
            break;
        }
        read += n as u64;
    }
    Ok(read)
}

/// Fill as much of `buf` as the reader allows; 0 means end of file
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_copy_and_drain_across_chunks() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("dest.bin");
        let data = pattern(10_000);
        fs::write(&src, &data).unwrap();

        // chunk size that does not divide the file evenly
        assert_eq!(copy_chunked(&src, &dest, 4096, &AbortFlag::new()).unwrap(), 10_000);
        assert_eq!(fs::read(&dest).unwrap(), data);
        assert_eq!(drain_chunked(&dest, 4096, &AbortFlag::new()).unwrap(), 10_000);
    }

    #[test]
    fn test_copy_truncates_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("dest.bin");
        fs::write(&src, b"short").unwrap();
        fs::write(&dest, vec![7u8; 1000]).unwrap();

        assert_eq!(copy_chunked(&src, &dest, 2, &AbortFlag::new()).unwrap(), 5);
        assert_eq!(fs::read(&dest).unwrap(), b"short");
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty");
        let dest = dir.path().join("copy");
        fs::write(&src, b"").unwrap();
        assert_eq!(copy_chunked(&src, &dest, 16, &AbortFlag::new()).unwrap(), 0);
        assert!(dest.exists());
        assert_eq!(drain_chunked(&dest, 16, &AbortFlag::new()).unwrap(), 0);
    }

    #[test]
    fn test_delete_if_exists_is_best_effort() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("victim");
        fs::write(&path, b"x").unwrap();
        delete_if_exists(&path);
        assert!(!path.exists());
        // absent file and a directory both leave no error behind
        delete_if_exists(&path);
        delete_if_exists(dir.path());
        assert!(dir.path().exists());
    }

    #[test]
    fn test_missing_source_errors() {
        let dir = tempdir().unwrap();
        let abort = AbortFlag::new();
        let err = copy_chunked(&dir.path().join("nope"), &dir.path().join("out"), 8, &abort)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_raised_abort_stops_between_chunks() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("dest.bin");
        fs::write(&src, pattern(1000)).unwrap();

        let abort = AbortFlag::new();
        abort.raise();
        let err = copy_chunked(&src, &dest, 100, &abort).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);

        let err = drain_chunked(&src, 100, &abort).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }
}
