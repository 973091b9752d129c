/// Configuration for blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob (safety guard).
    /// Writes are buffered before commit, so this also bounds write memory.
    pub max_blob_bytes: u64,

    /// Deepest namespace chain a request may address
    pub max_namespace_depth: usize,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 256 * 1024 * 1024, // 256MB
            max_namespace_depth: 16,
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Set max namespace depth
    pub fn with_max_namespace_depth(mut self, depth: usize) -> Self {
        self.max_namespace_depth = depth;
        self
    }
}
