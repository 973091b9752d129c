//! blobway-core: transport-agnostic core for the blobway gateway.
//!
//! Holds the pieces every other blobway crate leans on:
//! - structured errors that can ride inside `anyhow::Error`
//! - a string key/value configuration store with env overrides
//! - the runtime [`Mode`] that decides how much error detail leaves the process

pub mod config;
pub mod errors;
pub mod mode;

pub use config::{load_env_config, BlobwayConfig, BlobwayConfigSnapshot};
pub use errors::{BlobwayError, BlobwayResult, ErrorKind};
pub use mode::Mode;
