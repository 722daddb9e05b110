//! # Collectors Module
//!
//! Drives scan passes over the registry and turns the aggregated state into reports.
//!
//! ## Architecture
//!
//! - **`Collector` trait**: Defines the interface for all collectors
//! - **`NamespaceCollector`**: One scan unit per namespace: the executor scan first, then
//!   one concurrent server scan per job
//! - **`Orchestrator`**: Runs a whole collection cycle: creates the shared analyzer,
//!   scans all namespaces in parallel and renders the fleet report
//!
//! ## Failure handling
//!
//! A registry failure ends only the unit it happened in. Other namespaces and jobs keep
//! going and everything merged so far stays in the snapshot.

pub mod collector;
pub mod namespace_collector;
pub mod orchestrator;

// Re-export the main types for easy access
pub use collector::Collector;
pub use namespace_collector::NamespaceCollector;
pub use orchestrator::Orchestrator;
