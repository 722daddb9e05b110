use super::{
    NamespaceTarget,
    NodeStat,
    RegistryAccessor,
    RegistryError,
};
use chrono::{
    DateTime,
    Utc,
};
use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use serde::Deserialize;
use std::{
    collections::{
        BTreeMap,
        BTreeSet,
    },
    ops::Bound,
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
};

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read registry snapshot {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse registry snapshot: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("Invalid node {path} in namespace {namespace}: {reason}")]
    InvalidNode {
        namespace: String,
        path: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    pub value: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// Immutable in-memory copy of one namespace subtree.
///
/// Nodes are stored by absolute path. Parents do not need to be listed: a path exists
/// as soon as it is a node or the prefix of one.
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    nodes: BTreeMap<String, SnapshotNode>,
    captured_at: DateTime<Utc>,
}

impl SnapshotRegistry {
    pub fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            captured_at,
        }
    }

    pub fn with_node(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(
            path,
            SnapshotNode {
                value: Some(value.into()),
                created: None,
            },
        );
        self
    }

    /// A node without data, like the ephemeral markers executors create.
    pub fn with_marker(mut self, path: impl Into<String>) -> Self {
        self.insert(
            path,
            SnapshotNode {
                value: None,
                created: None,
            },
        );
        self
    }

    pub fn with_marker_created(mut self, path: impl Into<String>, created: DateTime<Utc>) -> Self {
        self.insert(
            path,
            SnapshotNode {
                value: None,
                created: Some(created),
            },
        );
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, node: SnapshotNode) {
        let path = path.into();
        let path = normalize(&path);
        self.nodes.insert(path.to_string(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn descendants<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.nodes
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(path, _)| path.as_str())
            .take_while(move |path| path.starts_with(prefix))
    }

    fn node_exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.nodes.contains_key(path) || self.descendants(&child_prefix(path)).next().is_some()
    }

    fn child_names(&self, path: &str) -> Option<Vec<String>> {
        let path = normalize(path);
        if !self.node_exists(path) {
            return None;
        }
        let prefix = child_prefix(path);
        let names = self
            .descendants(&prefix)
            .filter_map(|descendant| descendant[prefix.len()..].split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        Some(names.into_iter().collect())
    }

    fn node_value(&self, path: &str) -> Option<String> {
        self.nodes.get(normalize(path)).and_then(|node| node.value.clone())
    }

    fn node_stat(&self, path: &str) -> Option<NodeStat> {
        let path = normalize(path);
        match self.nodes.get(path) {
            Some(node) => Some(NodeStat {
                created: node.created.unwrap_or(self.captured_at),
            }),
            None if self.node_exists(path) => Some(NodeStat {
                created: self.captured_at,
            }),
            None => None,
        }
    }
}

impl Default for SnapshotRegistry {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl RegistryAccessor for SnapshotRegistry {
    fn exists<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool, RegistryError>> {
        async move { Ok(self.node_exists(path)) }.boxed()
    }

    fn children<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Vec<String>>, RegistryError>> {
        async move { Ok(self.child_names(path)) }.boxed()
    }

    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, RegistryError>> {
        async move { Ok(self.node_value(path)) }.boxed()
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<NodeStat>, RegistryError>> {
        async move { Ok(self.node_stat(path)) }.boxed()
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{path}/")
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-
// Snapshot files

/// On-disk dump of several namespaces.
///
/// ```yaml
/// captured_at: 2026-10-19T00:00:00Z
/// namespaces:
///   ns1:
///     name_and_namespace: payments/ns1
///     nodes:
///       /$SaturnExecutors/executors/e1/ip: 10.0.0.1
///       /$SaturnExecutors/executors/e1/noTraffic: { created: 2026-10-17T00:00:00Z }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceSnapshot {
    #[serde(default)]
    pub name_and_namespace: Option<String>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Detailed(DetailedNode),
    Scalar(serde_yml::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedNode {
    #[serde(default)]
    pub value: Option<serde_yml::Value>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_yml::from_str(content)?)
    }

    /// Builds one registry per namespace, in namespace order.
    pub fn into_targets(self) -> Result<Vec<NamespaceTarget>, SnapshotError> {
        let captured_at = self.captured_at.unwrap_or_else(Utc::now);
        let mut targets = Vec::with_capacity(self.namespaces.len());

        for (namespace, snapshot) in self.namespaces {
            let mut registry = SnapshotRegistry::new(captured_at);
            for (path, spec) in snapshot.nodes {
                let node = spec.into_node().map_err(|reason| SnapshotError::InvalidNode {
                    namespace: namespace.clone(),
                    path: path.clone(),
                    reason,
                })?;
                registry.insert(path, node);
            }
            let name_and_namespace = snapshot.name_and_namespace.unwrap_or_else(|| namespace.clone());
            targets.push(NamespaceTarget::new(namespace, name_and_namespace, Arc::new(registry)));
        }

        Ok(targets)
    }
}

impl NodeSpec {
    fn into_node(self) -> Result<SnapshotNode, String> {
        match self {
            NodeSpec::Scalar(value) => Ok(SnapshotNode {
                value: scalar_text(value)?,
                created: None,
            }),
            NodeSpec::Detailed(DetailedNode { value, created }) => Ok(SnapshotNode {
                value: value.map(scalar_text).transpose()?.flatten(),
                created,
            }),
        }
    }
}

fn scalar_text(value: serde_yml::Value) -> Result<Option<String>, String> {
    match value {
        serde_yml::Value::Null => Ok(None),
        serde_yml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yml::Value::String(s) => Ok(Some(s)),
        other => Err(format!("expected a scalar value, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use pretty_assertions::assert_eq;

    fn registry() -> SnapshotRegistry {
        SnapshotRegistry::new(Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap())
            .with_node("/$SaturnExecutors/executors/e2/ip", "10.0.0.2")
            .with_node("/$SaturnExecutors/executors/e1/ip", "10.0.0.1")
            .with_marker("/$SaturnExecutors/executors/e1-old/version")
            .with_marker("/$Jobs/j1/config/enabled/")
    }

    #[tokio::test]
    async fn implicit_parents_exist() {
        let registry = registry();
        assert!(registry.exists("/$SaturnExecutors").await.unwrap());
        assert!(registry.exists("/$SaturnExecutors/executors/e1").await.unwrap());
        assert!(!registry.exists("/$SaturnExecutors/executors/e3").await.unwrap());
        assert!(registry.exists("/$Jobs/j1/config/enabled").await.unwrap());
    }

    #[tokio::test]
    async fn children_are_direct_and_sorted() {
        let registry = registry();
        assert_eq!(
            registry.children("/$SaturnExecutors/executors").await.unwrap(),
            Some(vec!["e1".to_string(), "e1-old".to_string(), "e2".to_string()])
        );
        assert_eq!(
            registry.children("/").await.unwrap(),
            Some(vec!["$Jobs".to_string(), "$SaturnExecutors".to_string()])
        );
        assert_eq!(
            registry.children("/$SaturnExecutors/executors/e1/ip").await.unwrap(),
            Some(vec![])
        );
        assert_eq!(registry.children("/$Nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_and_stat() {
        let registry = registry();
        assert_eq!(
            registry.read("/$SaturnExecutors/executors/e1/ip").await.unwrap(),
            Some("10.0.0.1".to_string())
        );
        assert_eq!(registry.read("/$Jobs/j1/config/enabled").await.unwrap(), None);
        assert_eq!(registry.read("/$SaturnExecutors/executors/e1").await.unwrap(), None);

        let stat = registry.stat("/$SaturnExecutors/executors/e1").await.unwrap().unwrap();
        assert_eq!(stat.created, Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
        assert_eq!(registry.stat("/$SaturnExecutors/executors/e3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn snapshot_file_round_trip() {
        let yaml = r#"
captured_at: 2026-10-19T00:00:00Z
namespaces:
  ns2:
    nodes:
      /$Jobs/j1/servers/e1/processSuccessCount: 12
  ns1:
    name_and_namespace: payments/ns1
    nodes:
      /$SaturnExecutors/executors/e1/ip: 10.0.0.1
      /$SaturnExecutors/executors/e1/noTraffic: { created: 2026-10-17T00:00:00Z }
      /$Jobs/j1/config/enabled: true
"#;
        let dir = temp_dir::TempDir::new().unwrap();
        let file = dir.child("registry.yaml");
        std::fs::write(&file, yaml).unwrap();

        let targets = RegistrySnapshot::load(&file).unwrap().into_targets().unwrap();
        let names = targets.iter().map(|t| t.namespace.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["ns1", "ns2"]);
        assert_eq!(targets[0].name_and_namespace, "payments/ns1");
        assert_eq!(targets[1].name_and_namespace, "ns2");

        let ns1 = &targets[0].registry;
        assert_eq!(
            ns1.read("/$Jobs/j1/config/enabled").await.unwrap(),
            Some("true".to_string())
        );
        let stat = ns1
            .stat("/$SaturnExecutors/executors/e1/noTraffic")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stat.created, Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap());

        let ns2 = &targets[1].registry;
        assert_eq!(
            ns2.read("/$Jobs/j1/servers/e1/processSuccessCount").await.unwrap(),
            Some("12".to_string())
        );
    }

    #[test]
    fn non_scalar_nodes_are_rejected() {
        let yaml = "namespaces:\n  ns1:\n    nodes:\n      /a: [1, 2]\n";
        let err = RegistrySnapshot::from_yaml(yaml).unwrap().into_targets().unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidNode { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RegistrySnapshot::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
