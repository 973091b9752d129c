mod seed;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use blobway_axum::{gateway_app, BlobGateway, GatewayApp, GatewayConfig};
use blobway_core::{load_env_config, BlobwayConfig, BlobwayConfigSnapshot};
use blobway_store::{MemoryBackend, Sublevel, DEFAULT_CHUNK_BYTES};

pub use seed::{import_dir, SeedReport};

/// Environment variables starting with this become config keys
pub const ENV_PREFIX: &str = "BLOBWAY__";

/// A built gateway plus the configuration it was built from
pub struct BlobwayServer {
    pub app: GatewayApp,
    pub config: BlobwayConfigSnapshot,
}

impl BlobwayServer {
    pub fn addr(&self) -> String {
        let host = self
            .config
            .get_string("http.host")
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = self
            .config
            .get_string("http.port")
            .unwrap_or_else(|| "3030".to_string());
        format!("{host}:{port}")
    }

    pub async fn listen(self) -> Result<()> {
        let addr = self.addr();
        self.app.listen(addr).await
    }
}

/// Defaults overlaid with `BLOBWAY__*` environment variables
pub fn load_config() -> BlobwayConfig {
    let mut config = BlobwayConfig::new();
    config.set("http.host", "127.0.0.1");
    config.set("http.port", "3030");
    load_env_config(&mut config, ENV_PREFIX);
    config
}

pub async fn build() -> Result<BlobwayServer> {
    build_with(load_config()).await
}

pub async fn build_with(config: BlobwayConfig) -> Result<BlobwayServer> {
    let snapshot = config.snapshot();
    let gateway_config = GatewayConfig::from_snapshot(&snapshot)?;

    let chunk_bytes = snapshot
        .get_usize("store.read_chunk_bytes")
        .unwrap_or(DEFAULT_CHUNK_BYTES);
    let root = Sublevel::root(Arc::new(MemoryBackend::with_chunk_bytes(chunk_bytes)));

    if let Some(dir) = snapshot.get("seed.dir") {
        import_dir(&root, Path::new(dir), &gateway_config.store).await?;
    }

    tracing::info!(
        policy = %gateway_config.policy,
        mode = %gateway_config.mode,
        "blobway gateway configured"
    );

    let gateway = BlobGateway::new(root, gateway_config);
    Ok(BlobwayServer {
        app: gateway_app(gateway),
        config: snapshot,
    })
}
