use crate::{ByteStream, Version};

/// Receipt returned after successfully committing a blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub id: String,
    pub version: Version,
    pub size_bytes: u64,
}

/// Result of opening a blob for reading.
///
/// `version` and `stream` come from the same backend read, so the bytes always
/// belong to the version reported here. The stream is single-pass; dropping it
/// early stops the read and releases whatever the backend holds for it.
pub struct OpenedBlob {
    pub id: String,
    pub version: Version,
    pub size_bytes: u64,
    pub stream: ByteStream,
}

impl std::fmt::Debug for OpenedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedBlob")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}
