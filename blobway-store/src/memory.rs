use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
    BlobError, BlobResult, ByteStream, LevelBackend, Namespace, ReadOptions, StoredRead, Version,
};

/// Default size of the chunks a read stream yields
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

// namespace -> key -> record
type Partitions = HashMap<Namespace, HashMap<String, Record>>;

#[derive(Debug, Clone)]
struct Record {
    value: Bytes,
    version: Version,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Last marker handed out; shared by every partition
    sequence: u64,
    partitions: Partitions,
}

#[derive(Debug, Default)]
struct Faults {
    failing_writes: AtomicUsize,
    unavailable: AtomicBool,
    broken_streams: AtomicBool,
}

/// In-memory backend for tests, development and embedding.
///
/// Partitions come into existence with their first write, so opening one
/// (and therefore resolving a namespace chain) leaves the map untouched.
/// Reads snapshot the stored `Bytes` and hand them out lazily; dropping a
/// read stream releases the snapshot.
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    chunk_bytes: usize,
    faults: Faults,
    live_streams: Arc<AtomicUsize>,
}

/// Counts a read stream as live until the stream is dropped
struct LiveStream(Arc<AtomicUsize>);

impl LiveStream {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_chunk_bytes(DEFAULT_CHUNK_BYTES)
    }

    /// Read streams yield chunks of at most `chunk_bytes`
    pub fn with_chunk_bytes(chunk_bytes: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            chunk_bytes: chunk_bytes.max(1),
            faults: Faults::default(),
            live_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `count` writes fail with a backend error
    pub fn fail_next_writes(&self, count: usize) {
        self.faults.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make every read-side operation fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make read streams fail after their first chunk
    pub fn set_broken_streams(&self, broken: bool) {
        self.faults.broken_streams.store(broken, Ordering::SeqCst);
    }

    /// Whether anything has ever been written into a partition
    pub fn has_partition(&self, namespace: &Namespace) -> bool {
        self.state.read().partitions.contains_key(namespace)
    }

    /// Number of objects across every partition
    pub fn len(&self) -> usize {
        self.state.read().partitions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read streams handed out and not yet dropped
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> BlobResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(BlobError::backend(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "partition unreachable",
            )));
        }
        Ok(())
    }

    fn take_write_fault(&self) -> bool {
        self.faults
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn stream(&self, value: Bytes) -> ByteStream {
        let chunk_bytes = self.chunk_bytes;
        let broken = self.faults.broken_streams.load(Ordering::SeqCst);
        let live = LiveStream::new(&self.live_streams);

        Box::pin(async_stream::stream! {
            let _live = live;
            let mut rest = value;
            let mut sent = 0usize;
            while !rest.is_empty() {
                if broken && sent > 0 {
                    yield Err::<Bytes, std::io::Error>(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "read stream interrupted",
                    ));
                    break;
                }
                let take = chunk_bytes.min(rest.len());
                sent += 1;
                yield Ok::<Bytes, std::io::Error>(rest.split_to(take));
            }
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LevelBackend for MemoryBackend {
    async fn put(&self, namespace: &Namespace, key: &str, value: Bytes) -> BlobResult<Version> {
        if self.take_write_fault() {
            return Err(BlobError::backend(std::io::Error::other("injected write failure")));
        }

        let mut state = self.state.write();
        state.sequence += 1;
        let version = Version(state.sequence);
        state
            .partitions
            .entry(namespace.clone())
            .or_default()
            .insert(key.to_string(), Record { value, version });
        Ok(version)
    }

    async fn get(
        &self,
        namespace: &Namespace,
        key: &str,
        options: ReadOptions,
    ) -> BlobResult<Option<StoredRead>> {
        self.check_available()?;
        let record = self
            .state
            .read()
            .partitions
            .get(namespace)
            .and_then(|partition| partition.get(key))
            .cloned();

        Ok(record.map(|record| StoredRead {
            version: record.version,
            size_bytes: record.value.len() as u64,
            body: if options.metadata_only {
                None
            } else {
                Some(self.stream(record.value))
            },
        }))
    }

    async fn has(&self, namespace: &Namespace, key: &str) -> BlobResult<bool> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .partitions
            .get(namespace)
            .is_some_and(|partition| partition.contains_key(key)))
    }

    async fn delete(&self, namespace: &Namespace, key: &str) -> BlobResult<bool> {
        let mut state = self.state.write();
        Ok(state
            .partitions
            .get_mut(namespace)
            .is_some_and(|partition| partition.remove(key).is_some()))
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryBackend")
            .field("partitions", &state.partitions.len())
            .field("sequence", &state.sequence)
            .finish()
    }
}
