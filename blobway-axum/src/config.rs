use std::fmt;
use std::str::FromStr;

use blobway_core::{BlobwayConfigSnapshot, Mode};
use blobway_store::BlobConfig;
use serde::{Deserialize, Serialize};

/// How the gateway validates a found blob before streaming it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Presence check only; always 200 with the full payload
    ExistenceOnly,
    /// Version marker as `ETag`; a matching `If-None-Match` gets 304
    #[default]
    Conditional,
}

impl FromStr for CachePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "existence" | "existence-only" | "existence_only" => Ok(Self::ExistenceOnly),
            "conditional" | "etag" => Ok(Self::Conditional),
            other => Err(anyhow::anyhow!("unknown cache policy: {other}")),
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExistenceOnly => f.write_str("existence-only"),
            Self::Conditional => f.write_str("conditional"),
        }
    }
}

/// Everything a gateway needs to decide how to answer a request
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub policy: CachePolicy,
    pub mode: Mode,
    pub store: BlobConfig,
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_store(mut self, store: BlobConfig) -> Self {
        self.store = store;
        self
    }

    /// Read `gateway.policy`, `store.max_namespace_depth` and
    /// `store.max_blob_bytes`; unset keys keep their defaults.
    ///
    /// The mode is not a config key: it always comes from the environment.
    pub fn from_snapshot(snapshot: &BlobwayConfigSnapshot) -> anyhow::Result<Self> {
        let mut config = Self::default().with_mode(Mode::from_env());

        if let Some(policy) = snapshot.get("gateway.policy") {
            config.policy = policy.parse()?;
        }
        if let Some(depth) = snapshot.get_usize("store.max_namespace_depth") {
            config.store = config.store.with_max_namespace_depth(depth);
        }
        if let Some(bytes) = snapshot.get_u64("store.max_blob_bytes") {
            config.store = config.store.with_max_blob_bytes(bytes);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobway_core::BlobwayConfig;

    #[test]
    fn policy_parses_known_names() {
        assert_eq!("existence".parse::<CachePolicy>().unwrap(), CachePolicy::ExistenceOnly);
        assert_eq!("Conditional".parse::<CachePolicy>().unwrap(), CachePolicy::Conditional);
        assert!("sometimes".parse::<CachePolicy>().is_err());
    }

    #[test]
    fn snapshot_overrides_defaults() {
        let mut config = BlobwayConfig::new();
        config.set("gateway.policy", "existence-only");
        config.set("store.max_namespace_depth", "3");
        config.set("store.max_blob_bytes", "1024");

        let gateway = GatewayConfig::from_snapshot(&config.snapshot()).unwrap();
        assert_eq!(gateway.policy, CachePolicy::ExistenceOnly);
        assert_eq!(gateway.store.max_namespace_depth, 3);
        assert_eq!(gateway.store.max_blob_bytes, 1024);
    }

    #[test]
    fn empty_snapshot_keeps_defaults() {
        let gateway = GatewayConfig::from_snapshot(&BlobwayConfig::new().snapshot()).unwrap();
        assert_eq!(gateway.policy, CachePolicy::Conditional);
        assert_eq!(gateway.store.max_namespace_depth, 16);
    }

    #[test]
    fn bad_policy_is_an_error() {
        let mut config = BlobwayConfig::new();
        config.set("gateway.policy", "maybe");
        assert!(GatewayConfig::from_snapshot(&config.snapshot()).is_err());
    }
}
