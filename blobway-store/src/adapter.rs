use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::{
    route, BlobConfig, BlobError, BlobResult, ByteStream, OpenedBlob, ReadOptions, Sublevel,
    Version, WritePayload, WriteReceipt,
};

/// Completion callback for [`BlobAdapter::write_with`]
pub type WriteCallback = Box<dyn FnOnce(BlobResult<WriteReceipt>) + Send + 'static>;

/// Blob operations scoped to one store handle
#[derive(Clone, Debug)]
pub struct BlobAdapter {
    store: Sublevel,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter
    pub fn new(store: Sublevel, config: BlobConfig) -> Self {
        Self { store, config }
    }

    /// Commit a payload under `id`.
    ///
    /// Stream payloads are buffered in full first; a stream error or an
    /// oversized payload commits nothing.
    pub async fn write(
        &self,
        id: &str,
        payload: impl Into<WritePayload>,
    ) -> BlobResult<WriteReceipt> {
        validate_id(id)?;

        let value = match payload.into() {
            WritePayload::Bytes(bytes) => bytes,
            WritePayload::Stream(stream) => self.buffer(stream).await?,
        };

        let size_bytes = value.len() as u64;
        if size_bytes > self.config.max_blob_bytes {
            return Err(BlobError::PayloadTooLarge {
                size: size_bytes,
                max: self.config.max_blob_bytes,
            });
        }

        let version = self.store.backend().put(self.store.namespace(), id, value).await?;
        tracing::debug!(
            namespace = %self.store.namespace(),
            id,
            %version,
            size_bytes,
            "blob committed"
        );

        Ok(WriteReceipt {
            id: id.to_string(),
            version,
            size_bytes,
        })
    }

    /// Buffer `stream` completely, then commit it
    pub async fn write_stream(&self, id: &str, stream: ByteStream) -> BlobResult<WriteReceipt> {
        self.write(id, WritePayload::Stream(stream)).await
    }

    /// Commit in the background and report the outcome through `callback`.
    ///
    /// The callback runs exactly once per call, on success and on failure.
    /// A task dropped before it finishes (runtime shutdown, abort) reports
    /// `BlobError::Backend` with an `Interrupted` source.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime, like `tokio::spawn`.
    pub fn write_with(
        &self,
        id: impl Into<String>,
        payload: impl Into<WritePayload>,
        callback: Option<WriteCallback>,
    ) -> JoinHandle<()> {
        let adapter = self.clone();
        let id = id.into();
        let payload = payload.into();
        let pending = PendingCallback(callback);

        tokio::spawn(async move {
            let result = adapter.write(&id, payload).await;
            if let Err(err) = &result {
                tracing::warn!(id = %id, error = %err, "blob write failed");
            }
            pending.complete(result);
        })
    }

    /// Key presence, without payload transfer
    pub async fn exists(&self, id: &str) -> BlobResult<bool> {
        self.store.backend().has(self.store.namespace(), id).await
    }

    /// Current version marker, read in metadata-only mode
    pub async fn version(&self, id: &str) -> BlobResult<Option<Version>> {
        let read = self
            .store
            .backend()
            .get(self.store.namespace(), id, ReadOptions::metadata_only())
            .await?;
        Ok(read.map(|read| read.version))
    }

    /// Open a blob for streaming; `Ok(None)` when absent
    pub async fn open(&self, id: &str) -> BlobResult<Option<OpenedBlob>> {
        let read = self
            .store
            .backend()
            .get(self.store.namespace(), id, ReadOptions::full())
            .await?;

        Ok(read.map(|read| OpenedBlob {
            id: id.to_string(),
            version: read.version,
            size_bytes: read.size_bytes,
            stream: read.body.unwrap_or_else(|| {
                Box::pin(futures_util::stream::empty::<Result<Bytes, std::io::Error>>())
            }),
        }))
    }

    /// Read a whole blob into memory
    pub async fn read_to_bytes(&self, id: &str) -> BlobResult<Bytes> {
        let opened = self
            .open(id)
            .await?
            .ok_or_else(|| BlobError::not_found(id))?;
        self.buffer(opened.stream).await
    }

    /// Delete a blob. Administrative path; the gateway never calls it.
    pub async fn remove(&self, id: &str) -> BlobResult<bool> {
        let removed = self.store.backend().delete(self.store.namespace(), id).await?;
        tracing::debug!(namespace = %self.store.namespace(), id, removed, "blob removed");
        Ok(removed)
    }

    /// Canonical URL path of `id` in this adapter's store
    pub fn url(&self, id: &str) -> String {
        route::encode(&self.store, id)
    }

    /// Get the store handle
    pub fn store(&self) -> &Sublevel {
        &self.store
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    async fn buffer(&self, mut stream: ByteStream) -> BlobResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (buf.len() + chunk.len()) as u64 > self.config.max_blob_bytes {
                return Err(BlobError::PayloadTooLarge {
                    size: (buf.len() + chunk.len()) as u64,
                    max: self.config.max_blob_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// Owns a write callback until it has been called.
///
/// Dropping it uncalled reports an interrupted write, so the callback still
/// fires once when the spawned task never gets to finish.
struct PendingCallback(Option<WriteCallback>);

impl PendingCallback {
    fn complete(mut self, result: BlobResult<WriteReceipt>) {
        if let Some(callback) = self.0.take() {
            callback(result);
        }
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if let Some(callback) = self.0.take() {
            tracing::warn!("blob write task dropped before completing");
            callback(Err(BlobError::backend(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "write task dropped before completing",
            ))));
        }
    }
}

fn validate_id(id: &str) -> BlobResult<()> {
    if id.is_empty() {
        return Err(BlobError::invalid("blob id must not be empty"));
    }
    Ok(())
}
