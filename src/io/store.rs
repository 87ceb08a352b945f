//! Remote large-object store abstraction
//!
//! The store keeps any number of versions per file name. Direct-mode trials
//! only ever talk to it through [`ObjectStore`], so the GridFS driver and the
//! in-process [`MemoryStore`] are interchangeable.

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{BenchError, Result, CHUNK_SIZE};

/// Outcome of streaming one stored object back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    /// Length recorded in the object's metadata
    pub declared_length: u64,
    /// Bytes actually streamed
    pub bytes_read: u64,
}

impl Download {
    /// Bytes read, or an integrity error when they disagree with the declared length
    pub fn verify(&self, name: &str) -> Result<u64> {
        if self.bytes_read == self.declared_length {
            Ok(self.bytes_read)
        } else {
            Err(BenchError::IntegrityError {
                name: name.to_string(),
                expected: self.declared_length,
                actual: self.bytes_read,
            })
        }
    }
}

/// Versioned object store keyed by file name
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete every stored version of `name`, returning how many were removed
    async fn delete_versions(&self, name: &str) -> Result<usize>;

    /// Stream `source` into a new version of `name` in `CHUNK_SIZE` pieces,
    /// returning the bytes uploaded
    async fn upload(
        &self,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64>;

    /// Stream the latest version of `name` in `CHUNK_SIZE` pieces
    async fn download(&self, name: &str) -> Result<Download>;

    /// Number of stored versions of `name`
    async fn version_count(&self, name: &str) -> Result<usize>;
}

/// Fill as much of `buf` as the reader allows; 0 means end of stream
pub(crate) async fn fill_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    declared_length: u64,
}

/// In-process versioned store with the same semantics as GridFS
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<StoredObject>>>> {
        self.objects
            .lock()
            .map_err(|_| BenchError::BenchmarkError("Memory store lock poisoned".to_string()))
    }

    /// Store an extra version directly, as a previous run might have left it
    pub fn insert_version(&self, name: &str, data: Vec<u8>) -> Result<()> {
        let declared_length = data.len() as u64;
        self.objects()?
            .entry(name.to_string())
            .or_default()
            .push(StoredObject {
                data,
                declared_length,
            });
        Ok(())
    }

    /// Drop trailing bytes of the latest version while keeping its declared length
    #[cfg(test)]
    pub(crate) fn truncate_latest(&self, name: &str, len: usize) -> Result<()> {
        let mut objects = self.objects()?;
        let latest = objects
            .get_mut(name)
            .and_then(|versions| versions.last_mut())
            .ok_or_else(|| BenchError::ObjectNotFound(name.to_string()))?;
        latest.data.truncate(len);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn delete_versions(&self, name: &str) -> Result<usize> {
        let removed = self.objects()?.remove(name).map_or(0, |versions| versions.len());
        Ok(removed)
    }

    async fn upload(
        &self,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64> {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut data = Vec::new();
        loop {
            let n = fill_chunk(source, &mut buffer).await?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buffer[..n]);
        }
        let uploaded = data.len() as u64;
        self.insert_version(name, data)?;
        Ok(uploaded)
    }

    async fn download(&self, name: &str) -> Result<Download> {
        let objects = self.objects()?;
        let latest = objects
            .get(name)
            .and_then(|versions| versions.last())
            .ok_or_else(|| BenchError::ObjectNotFound(name.to_string()))?;

        let bytes_read = latest
            .data
            .chunks(CHUNK_SIZE)
            .map(|chunk| chunk.len() as u64)
            .sum();

        Ok(Download {
            declared_length: latest.declared_length,
            bytes_read,
        })
    }

    async fn version_count(&self, name: &str) -> Result<usize> {
        Ok(self.objects()?.get(name).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_round_trip() {
        let store = MemoryStore::new();
        let data = vec![3u8; CHUNK_SIZE + 17];
        let uploaded = store.upload("big.bin", &mut data.as_slice()).await.unwrap();
        assert_eq!(uploaded, data.len() as u64);

        let download = store.download("big.bin").await.unwrap();
        assert_eq!(download.bytes_read, uploaded);
        assert_eq!(download.verify("big.bin").unwrap(), uploaded);
    }

    #[tokio::test]
    async fn test_versions_accumulate_until_deleted() {
        let store = MemoryStore::new();
        store.insert_version("a", b"one".to_vec()).unwrap();
        store.upload("a", &mut &b"three"[..]).await.unwrap();
        assert_eq!(store.version_count("a").await.unwrap(), 2);

        // latest version wins
        assert_eq!(store.download("a").await.unwrap().bytes_read, 5);

        assert_eq!(store.delete_versions("a").await.unwrap(), 2);
        assert_eq!(store.delete_versions("a").await.unwrap(), 0);
        assert_eq!(store.version_count("a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let store = MemoryStore::new();
        let err = store.download("ghost").await.unwrap_err();
        assert!(matches!(err, BenchError::ObjectNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_truncated_object_fails_verification() {
        let store = MemoryStore::new();
        store.insert_version("t", vec![1u8; 100]).unwrap();
        store.truncate_latest("t", 60).unwrap();

        let download = store.download("t").await.unwrap();
        assert_eq!(download.declared_length, 100);
        assert_eq!(download.bytes_read, 60);
        let err = download.verify("t").unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Integrity);
    }
}
