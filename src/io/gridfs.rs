//! GridFS-backed object store
//!
//! One bucket per runner, named after the collection prefix so files and
//! chunks land in `<prefix>.files` / `<prefix>.chunks`. The server must
//! answer a ping before any trial runs; the client is never closed explicitly.

use std::time::Duration;

use async_trait::async_trait;
use futures::io::{AsyncReadExt, AsyncWriteExt};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::gridfs::{FilesCollectionDocument, GridFsBucket};
use mongodb::options::{ClientOptions, GridFsBucketOptions};
use mongodb::Client;
use tokio::io::AsyncRead;

use crate::config::ConnectionParams;
use crate::io::store::{fill_chunk, Download, ObjectStore};
use crate::{BenchError, Result, CHUNK_SIZE};

pub struct GridFsStore {
    bucket: GridFsBucket,
}

impl GridFsStore {
    /// Connect to the server named by `params` and open its bucket.
    ///
    /// `selection_timeout` bounds how long an unreachable server is waited
    /// for; `None` keeps the driver default.
    pub async fn connect(
        params: &ConnectionParams,
        selection_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut client_options = ClientOptions::parse(params.uri()).await?;
        if let Some(timeout) = selection_timeout {
            client_options.server_selection_timeout = Some(timeout);
        }
        let client = Client::with_options(client_options)?;
        let database = client.database(&params.db);
        database.run_command(doc! { "ping": 1 }).await?;

        let options = GridFsBucketOptions::builder()
            .bucket_name(params.coll_prefix.clone())
            .chunk_size_bytes(CHUNK_SIZE as u32)
            .build();
        let bucket = database.gridfs_bucket(options);

        tracing::debug!(
            uri = %params.uri(),
            db = %params.db,
            bucket = %params.coll_prefix,
            "connected, GridFS bucket ready"
        );
        Ok(Self { bucket })
    }

    async fn versions(&self, name: &str) -> Result<Vec<FilesCollectionDocument>> {
        let cursor = self.bucket.find(doc! { "filename": name }).await?;
        let versions = cursor.try_collect().await?;
        Ok(versions)
    }
}

#[async_trait]
impl ObjectStore for GridFsStore {
    async fn delete_versions(&self, name: &str) -> Result<usize> {
        let mut deleted = 0;
        // re-query until empty: versions can show up while deleting
        loop {
            let versions = self.versions(name).await?;
            if versions.is_empty() {
                break;
            }
            for version in versions {
                self.bucket.delete(version.id).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn upload(
        &self,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64> {
        let mut stream = self.bucket.open_upload_stream(name).await?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut uploaded = 0u64;
        loop {
            let n = fill_chunk(source, &mut buffer).await?;
            if n == 0 {
                break;
            }
            stream.write_all(&buffer[..n]).await?;
            uploaded += n as u64;
        }
        stream.close().await?;
        Ok(uploaded)
    }

    async fn download(&self, name: &str) -> Result<Download> {
        let latest = self
            .versions(name)
            .await?
            .into_iter()
            .max_by_key(|version| version.upload_date)
            .ok_or_else(|| BenchError::ObjectNotFound(name.to_string()))?;

        let declared_length = latest.length;
        let mut stream = self.bucket.open_download_stream(latest.id).await?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut bytes_read = 0u64;
        loop {
            let n = stream.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;
        }

        Ok(Download {
            declared_length,
            bytes_read,
        })
    }

    async fn version_count(&self, name: &str) -> Result<usize> {
        Ok(self.versions(name).await?.len())
    }
}
