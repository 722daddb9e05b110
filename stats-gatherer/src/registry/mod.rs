//! # Registry Module
//!
//! The narrow contract the analyzer needs from the coordination registry, plus the
//! path layout of the executor and job subtrees.
//!
//! ## Key Components
//!
//! - **`RegistryAccessor`**: existence check, children listing, value read and node
//!   metadata for a namespace-scoped registry session
//! - **`paths`**: builders for every node path the analyzer touches
//! - **`SnapshotRegistry`**: an in-memory registry loaded from a snapshot file
//!
//! Absent data is never an error: a missing node is `false` / `None`. Only transport
//! or session problems surface as [`RegistryError`].

pub mod paths;
pub mod snapshot;

use chrono::{
    DateTime,
    Utc,
};
use futures::future::BoxFuture;
use std::{
    fmt,
    sync::Arc,
};

pub use snapshot::{
    NamespaceSnapshot,
    RegistrySnapshot,
    SnapshotError,
    SnapshotRegistry,
};

/// Node metadata as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    pub created: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry transport failed while accessing {path}: {reason}")]
    Transport { path: String, reason: String },
    #[error("Registry session expired while accessing {path}")]
    Session { path: String },
    #[error("Registry connection is closed")]
    Closed,
}

/// Read access to one namespace of the coordination registry.
///
/// All paths are absolute within the namespace, e.g. `/$Jobs/my-job/servers`.
pub trait RegistryAccessor: Send + Sync {
    fn exists<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool, RegistryError>>;

    /// Child segment names in registry order, `None` if `path` does not exist.
    fn children<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Vec<String>>, RegistryError>>;

    /// Node value, `None` if the node does not exist or holds no data.
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, RegistryError>>;

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<NodeStat>, RegistryError>>;
}

/// A namespace together with the registry session scoped to it.
#[derive(Clone)]
pub struct NamespaceTarget {
    pub namespace: String,
    pub name_and_namespace: String,
    pub registry: Arc<dyn RegistryAccessor>,
}

impl NamespaceTarget {
    pub fn new(
        namespace: impl Into<String>,
        name_and_namespace: impl Into<String>,
        registry: Arc<dyn RegistryAccessor>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name_and_namespace: name_and_namespace.into(),
            registry,
        }
    }
}

impl fmt::Debug for NamespaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceTarget")
            .field("namespace", &self.namespace)
            .field("name_and_namespace", &self.name_and_namespace)
            .finish_non_exhaustive()
    }
}
