//! # Fleet Health Stats Gatherer
//!
//! Health and load analysis for a fleet of job executors coordinated through a
//! hierarchical registry.
//!
//! ## Features
//!
//! - **Executor scan**: online executors, docker placement, version attribution per namespace
//! - **Job scan**: processed / failed counters of the day and shard-weighted executor load
//! - **No-traffic alarms**: one alarm per executor drained for longer than the threshold
//! - **Terminal report**: tables for versions, executors and jobs
//! - **JSON export**: the whole snapshot of a cycle for programmatic access
//!
//! ## Architecture
//!
//! - **`registry`**: the registry contract, node paths and the snapshot-backed registry
//! - **`analyzer`**: `FleetAnalyzer`, the concurrency-safe aggregation context of a cycle
//! - **`alarm`**: alarm payloads and the `AlarmSink` seam
//! - **`metrics`**: executor records, job statistics, version tallies and cycle snapshots
//! - **`collectors`**: per-namespace scan units and the `Orchestrator` driving a cycle
//!
//! ## Usage
//!
//! ```no_run
//! use fleet_health_stats_gatherer::{
//!     Collector,
//!     LoggingAlarmSink,
//!     Orchestrator,
//!     RegistrySnapshot,
//! };
//! use std::{
//!     path::Path,
//!     sync::Arc,
//! };
//!
//! # async fn run() -> eyre::Result<()> {
//! let targets = RegistrySnapshot::load(Path::new("registry.yaml"))?.into_targets()?;
//! let mut orchestrator = Orchestrator::new(targets, Arc::new(LoggingAlarmSink));
//! orchestrator.collect(chrono::Utc::now()).await?;
//! println!("{}", orchestrator.format());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod alarm;
pub mod analyzer;
pub mod collectors;
pub mod metrics;
pub mod registry;

pub use alarm::{
    AlarmError,
    AlarmEvent,
    AlarmInfo,
    AlarmLevel,
    AlarmSink,
    LoggingAlarmSink,
};
pub use analyzer::{
    Clock,
    FleetAnalyzer,
    StalenessDetector,
};
pub use collectors::*;
pub use metrics::*;
pub use registry::{
    NamespaceTarget,
    NodeStat,
    RegistryAccessor,
    RegistryError,
    RegistrySnapshot,
    SnapshotError,
    SnapshotRegistry,
};
