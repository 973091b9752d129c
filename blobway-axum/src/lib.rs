//! blobway-axum: HTTP gateway for blobway sublevel stores.
//!
//! `GET /files/<ns1>/.../<id>` streams a blob out of a nested partition,
//! with optional `ETag`/`If-None-Match` revalidation. The gateway is a plain
//! value: hand it a root [`blobway_store::Sublevel`], then take its router,
//! its writer or its URL builder as the embedding program needs.

pub mod app;
pub mod config;
pub mod gateway;
mod error;
pub use error::{store_error, BlobwayAxumError};
pub use gateway::{BlobGateway, ErrorHook};
pub use config::{CachePolicy, GatewayConfig};

pub use app::{gateway_app, GatewayApp};
