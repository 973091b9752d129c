//! # blobway-store: nested blob partitions over a key-value engine
//!
//! `blobway-store` gives a key-value engine a tree of named partitions
//! ("sublevels") and the small set of blob operations a read-only gateway
//! needs: presence checks, version markers without payload transfer, and
//! streaming reads whose bytes always match the version they report.
//!
//! ## Key Features
//!
//! - **Sublevel handles**: every handle knows its own name and its parent, so
//!   the path from the root can be rebuilt without a global registry
//! - **Metadata-only reads**: `version` answers conditional requests without
//!   reading payload bytes
//! - **Streaming reads**: payloads leave the store as a `ByteStream`
//! - **Buffer-and-commit writes**: a write either lands completely or not at all
//! - **URL codec**: `/files/<ns>/.../<id>` decoding and the matching encoder
//!
//! ## Quick Start
//!
//! ```rust
//! use blobway_store::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let root = Sublevel::new(MemoryBackend::new());
//! let music = root.sublevel("music").await?;
//!
//! let blobs = BlobAdapter::new(music, BlobConfig::default());
//! let receipt = blobs.write("song.mp3", b"ID3".to_vec()).await?;
//!
//! assert_eq!(blobs.version("song.mp3").await?, Some(receipt.version));
//! assert_eq!(blobs.url("song.mp3"), "/files/music/song.mp3");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Gateway / CLI   │  ← addressing, HTTP semantics
//! ├──────────────────┤
//! │   BlobAdapter    │  ← blob operations on one handle
//! ├──────────────────┤
//! │    Sublevel      │  ← partition lineage
//! ├──────────────────┤
//! │  LevelBackend    │  ← storage primitives
//! └──────────────────┘
//! ```

pub mod adapter;
pub mod backend;
mod config;
mod error;
mod memory;
mod receipt;
mod resolver;
pub mod route;
mod sublevel;
mod types;

pub use adapter::{BlobAdapter, WriteCallback};
pub use backend::LevelBackend;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory::{MemoryBackend, DEFAULT_CHUNK_BYTES};
pub use receipt::{OpenedBlob, WriteReceipt};
pub use resolver::NamespaceResolver;
pub use route::{BlobPath, FAVICON_PATH, ROUTE_PREFIX};
pub use sublevel::{Ancestors, Sublevel};
pub use types::{ByteStream, Namespace, ReadOptions, StoredRead, Version, WritePayload};

/// Convenience re-exports for common usage
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobResult, ByteStream, LevelBackend, MemoryBackend,
        NamespaceResolver, OpenedBlob, Sublevel, Version, WriteReceipt,
    };
}
