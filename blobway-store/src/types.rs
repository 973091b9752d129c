use bytes::Bytes;
use futures_core::Stream;
use std::fmt;
use std::pin::Pin;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Monotonic marker assigned by the store on every write.
///
/// Two reads of an unmodified object yield the same marker; a later write
/// to the same key always yields a strictly greater one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

impl Version {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered partition names from the root store down to one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Vec<String>);

impl Namespace {
    /// The root store
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// The namespace one level further in
    pub fn child(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.push(name.to_string());
        Self(names)
    }
}

impl From<Vec<String>> for Namespace {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

/// Options for a backend read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return the version marker and size only, never payload bytes
    pub metadata_only: bool,
}

impl ReadOptions {
    pub fn full() -> Self {
        Self {
            metadata_only: false,
        }
    }

    pub fn metadata_only() -> Self {
        Self {
            metadata_only: true,
        }
    }
}

/// What a backend hands back for a present key
pub struct StoredRead {
    pub version: Version,
    pub size_bytes: u64,
    /// `None` for metadata-only reads
    pub body: Option<ByteStream>,
}

impl fmt::Debug for StoredRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredRead")
            .field("version", &self.version)
            .field("size_bytes", &self.size_bytes)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Payload accepted by the write path
pub enum WritePayload {
    Bytes(Bytes),
    /// Buffered completely before anything is committed
    Stream(ByteStream),
}

impl From<Bytes> for WritePayload {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for WritePayload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for WritePayload {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

impl From<&'static str> for WritePayload {
    fn from(value: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(value.as_bytes()))
    }
}

impl From<ByteStream> for WritePayload {
    fn from(value: ByteStream) -> Self {
        Self::Stream(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_child_appends() {
        let ns = Namespace::root().child("a").child("b");
        assert_eq!(ns.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ns.depth(), 2);
        assert_eq!(ns.to_string(), "/a/b");
        assert!(Namespace::root().is_root());
    }

    #[test]
    fn version_orders_and_displays() {
        assert!(Version(8) > Version(7));
        assert_eq!(Version::from(7).to_string(), "7");
    }
}
