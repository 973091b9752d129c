use crate::{BlobConfig, BlobError, BlobResult, Sublevel};

/// Walks a namespace chain from a root handle down to the leaf partition.
///
/// The chain comes straight from a request URL, so it is bounded: empty
/// names, `.`/`..` and chains deeper than `max_depth` are refused before the
/// store is touched.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    max_depth: usize,
}

impl NamespaceResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &BlobConfig) -> Self {
        Self::new(config.max_namespace_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check a chain without resolving it
    pub fn validate<S: AsRef<str>>(&self, chain: &[S]) -> BlobResult<()> {
        if chain.len() > self.max_depth {
            return Err(BlobError::NamespaceTooDeep {
                depth: chain.len(),
                max: self.max_depth,
            });
        }
        for name in chain {
            validate_name(name.as_ref())?;
        }
        Ok(())
    }

    /// Resolve `chain` (outer to inner) beneath `root`
    pub async fn resolve<S: AsRef<str>>(&self, root: &Sublevel, chain: &[S]) -> BlobResult<Sublevel> {
        self.validate(chain)?;

        let mut handle = root.clone();
        for name in chain {
            handle = handle.sublevel(name.as_ref()).await?;
        }
        Ok(handle)
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::from_config(&BlobConfig::default())
    }
}

fn validate_name(name: &str) -> BlobResult<()> {
    let reason = match name {
        "" => "empty name",
        "." | ".." => "relative name",
        _ if name.contains('/') => "contains a path separator",
        _ => return Ok(()),
    };
    Err(BlobError::InvalidNamespace {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    #[tokio::test]
    async fn empty_chain_is_root() {
        let root = Sublevel::new(MemoryBackend::new());
        let handle = NamespaceResolver::default()
            .resolve::<&str>(&root, &[])
            .await
            .unwrap();
        assert!(handle.is_root());
    }

    #[tokio::test]
    async fn resolves_nested_chain_in_order() {
        let root = Sublevel::new(MemoryBackend::new());
        let handle = NamespaceResolver::default()
            .resolve(&root, &["a", "b", "c"])
            .await
            .unwrap();
        assert_eq!(handle.namespace().names(), &["a", "b", "c"]);
        assert_eq!(handle.name(), Some("c"));
    }

    #[tokio::test]
    async fn rejects_empty_and_relative_names() {
        let root = Sublevel::new(MemoryBackend::new());
        let resolver = NamespaceResolver::default();
        for chain in [vec!["a", ""], vec![".."], vec!["."]] {
            let err = resolver.resolve(&root, chain.as_slice()).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidNamespace { .. }));
            assert!(err.is_not_found());
        }
    }

    #[tokio::test]
    async fn rejects_chains_deeper_than_limit() {
        let root = Sublevel::new(MemoryBackend::new());
        let resolver = NamespaceResolver::new(2);
        assert!(resolver.resolve(&root, &["a", "b"]).await.is_ok());
        let err = resolver.resolve(&root, &["a", "b", "c"]).await.unwrap_err();
        assert!(matches!(err, BlobError::NamespaceTooDeep { depth: 3, max: 2 }));
    }

    #[tokio::test]
    async fn rejected_chain_does_not_touch_store() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        let root = Sublevel::root(backend.clone());
        let _ = NamespaceResolver::default().resolve(&root, &["ok", ""]).await;
        assert!(!backend.has_partition(&crate::Namespace::root().child("ok")));
    }
}
