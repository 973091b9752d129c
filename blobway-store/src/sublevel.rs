use std::fmt;
use std::sync::Arc;

use crate::{BlobResult, LevelBackend, Namespace};

/// Back-reference from a handle to the partition that selected it.
///
/// Lineage nodes only describe ancestry; they never keep a backend alive and
/// are only walked to rebuild names.
#[derive(Debug)]
struct Lineage {
    name: String,
    parent: Option<Arc<Lineage>>,
}

/// Handle to a (possibly nested) partition of a [`LevelBackend`].
///
/// Cloning is cheap. The root handle has no parent; every other handle knows
/// its parent and the name that selected it from the parent.
#[derive(Clone)]
pub struct Sublevel {
    backend: Arc<dyn LevelBackend>,
    lineage: Option<Arc<Lineage>>,
    namespace: Namespace,
}

impl Sublevel {
    /// Root handle over a backend
    pub fn new<B: LevelBackend + 'static>(backend: B) -> Self {
        Self::root(Arc::new(backend))
    }

    /// Root handle over a shared backend
    pub fn root(backend: Arc<dyn LevelBackend>) -> Self {
        Self {
            backend,
            lineage: None,
            namespace: Namespace::root(),
        }
    }

    /// Obtain the named child partition, creating it if the backend needs that.
    pub async fn sublevel(&self, name: impl Into<String>) -> BlobResult<Sublevel> {
        let name = name.into();
        let namespace = self.namespace.child(&name);
        self.backend.open_partition(&namespace).await?;

        Ok(Self {
            backend: Arc::clone(&self.backend),
            lineage: Some(Arc::new(Lineage {
                name,
                parent: self.lineage.clone(),
            })),
            namespace,
        })
    }

    /// The name that selects this handle from its parent; `None` at the root
    pub fn name(&self) -> Option<&str> {
        self.lineage.as_deref().map(|node| node.name.as_str())
    }

    pub fn parent(&self) -> Option<Sublevel> {
        let node = self.lineage.as_deref()?;
        let names = self.namespace.names();
        Some(Self {
            backend: Arc::clone(&self.backend),
            lineage: node.parent.clone(),
            namespace: Namespace::from(names[..names.len() - 1].to_vec()),
        })
    }

    pub fn is_root(&self) -> bool {
        self.lineage.is_none()
    }

    pub fn depth(&self) -> usize {
        self.namespace.depth()
    }

    /// Selecting names from this handle up to the root, leaf first
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            cursor: self.lineage.as_deref(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn backend(&self) -> &Arc<dyn LevelBackend> {
        &self.backend
    }
}

impl fmt::Debug for Sublevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sublevel")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Iterator over a handle's selecting names, leaf to root
pub struct Ancestors<'a> {
    cursor: Option<&'a Lineage>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor?;
        self.cursor = node.parent.as_deref();
        Some(node.name.as_str())
    }
}
