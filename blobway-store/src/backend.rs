use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobResult, Namespace, ReadOptions, StoredRead, Version};

/// Key-value engine operations a gateway needs - implemented by every storage backend.
///
/// Keys are scoped by [`Namespace`]: the same key in two partitions names two
/// independent objects. Concurrency discipline belongs to the backend: reads
/// must be safe in parallel, and writes to one key must be serialized so that
/// the returned [`Version`] strictly increases.
#[async_trait]
pub trait LevelBackend: Send + Sync {
    /// Make sure a partition exists.
    ///
    /// Engines whose partitions spring into existence on first write keep the
    /// default no-op; resolution then stays side-effect free.
    async fn open_partition(&self, _namespace: &Namespace) -> BlobResult<()> {
        Ok(())
    }

    /// Commit `value` under `key`, returning the new version marker
    async fn put(&self, namespace: &Namespace, key: &str, value: Bytes) -> BlobResult<Version>;

    /// Read a key. `Ok(None)` when absent.
    async fn get(
        &self,
        namespace: &Namespace,
        key: &str,
        options: ReadOptions,
    ) -> BlobResult<Option<StoredRead>>;

    /// Check key presence without transferring payload bytes
    async fn has(&self, namespace: &Namespace, key: &str) -> BlobResult<bool>;

    /// Remove a key. Administrative only, never reached from a request.
    async fn delete(&self, namespace: &Namespace, key: &str) -> BlobResult<bool>;
}
