//! # blobway configuration
//!
//! A minimal string key/value store, layered however the embedding
//! process likes. Values are read back through an immutable
//! [`BlobwayConfigSnapshot`] with typed getters.
//!
//! ```rust
//! use blobway_core::BlobwayConfig;
//! let mut config = BlobwayConfig::new();
//!
//! config.set("gateway.policy", "conditional");
//! config.set("store.max_namespace_depth", "8");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_usize("store.max_namespace_depth"), Some(8));
//! ```
//!
//! ## Environment overrides
//!
//! [`load_env_config`] maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export BLOBWAY__GATEWAY__POLICY=existence   # -> gateway.policy
//! ```

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct BlobwayConfig {
    values: HashMap<String, String>,
}

impl BlobwayConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only if it is not present yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> BlobwayConfigSnapshot {
        BlobwayConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlobwayConfigSnapshot {
    map: HashMap<String, String>,
}

impl BlobwayConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

/// Copy every `PREFIX…` environment variable into `config`.
///
/// `BLOBWAY__STORE__MAX_NAMESPACE_DEPTH` becomes `store.max_namespace_depth`
/// for `prefix = "BLOBWAY__"`.
pub fn load_env_config(config: &mut BlobwayConfig, prefix: &str) {
    apply_vars(config, prefix, std::env::vars());
}

fn apply_vars<I>(config: &mut BlobwayConfig, prefix: &str, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let normalized = stripped.to_lowercase().replace("__", ".");
            if !normalized.is_empty() {
                config.set(normalized, value);
            }
        }
    }
}
