#![allow(dead_code)]

use chrono::{
    DateTime,
    TimeZone as _,
    Utc,
};
use fleet_health_stats_gatherer::{
    AlarmError,
    AlarmEvent,
    AlarmSink,
    FleetAnalyzer,
    NamespaceTarget,
    NodeStat,
    RegistryAccessor,
    RegistryError,
    SnapshotRegistry,
};
use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

pub const HOUR: Duration = Duration::from_secs(60 * 60);

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn ago(duration: Duration) -> DateTime<Utc> {
    now() - chrono::Duration::from_std(duration).unwrap()
}

pub fn registry() -> SnapshotRegistry {
    SnapshotRegistry::new(now())
}

pub fn target(namespace: &str, registry: impl RegistryAccessor + 'static) -> NamespaceTarget {
    NamespaceTarget::new(namespace, format!("{namespace}-name"), Arc::new(registry))
}

pub fn analyzer(sink: Arc<dyn AlarmSink>) -> FleetAnalyzer {
    FleetAnalyzer::new(sink).with_clock(now)
}

/// Keeps every alarm it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AlarmEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AlarmEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AlarmSink for RecordingSink {
    fn raise(&self, event: AlarmEvent) -> BoxFuture<'_, Result<(), AlarmError>> {
        async move {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
        .boxed()
    }
}

/// Rejects every alarm but remembers the attempts.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: Mutex<usize>,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl AlarmSink for FailingSink {
    fn raise(&self, _event: AlarmEvent) -> BoxFuture<'_, Result<(), AlarmError>> {
        async move {
            *self.attempts.lock().unwrap() += 1;
            Err(AlarmError::Unavailable("mail relay down".to_string()))
        }
        .boxed()
    }
}

/// Fails every access below `failing_prefix`, serves the rest from `inner`.
pub struct FailingRegistry {
    inner: SnapshotRegistry,
    failing_prefix: String,
}

impl FailingRegistry {
    pub fn new(inner: SnapshotRegistry, failing_prefix: impl Into<String>) -> Self {
        Self {
            inner,
            failing_prefix: failing_prefix.into(),
        }
    }

    fn check(&self, path: &str) -> Result<(), RegistryError> {
        if path.starts_with(&self.failing_prefix) {
            Err(RegistryError::Transport {
                path: path.to_string(),
                reason: "connection reset".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl RegistryAccessor for FailingRegistry {
    fn exists<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool, RegistryError>> {
        async move {
            self.check(path)?;
            self.inner.exists(path).await
        }
        .boxed()
    }

    fn children<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<Vec<String>>, RegistryError>> {
        async move {
            self.check(path)?;
            self.inner.children(path).await
        }
        .boxed()
    }

    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, RegistryError>> {
        async move {
            self.check(path)?;
            self.inner.read(path).await
        }
        .boxed()
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<NodeStat>, RegistryError>> {
        async move {
            self.check(path)?;
            self.inner.stat(path).await
        }
        .boxed()
    }
}
