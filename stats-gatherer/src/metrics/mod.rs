pub mod executor_stats;
pub mod job_stats;
pub mod version;

// Re-export the main types for easy access
use chrono::{
    DateTime,
    Utc,
};
pub use executor_stats::*;
pub use job_stats::*;
use serde::{
    Deserialize,
    Serialize,
};
pub use version::*;

/// Outcome of scanning the executor subtree of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorScanReport {
    pub namespace: String,
    /// Registered executors, online or not.
    pub total_executors: u64,
    pub online_executors: u64,
    /// Version the namespace was attributed to.
    pub version: String,
    pub stale_executors: Vec<String>,
    pub alarms_raised: usize,
    pub alarms_failed: usize,
}

impl ExecutorScanReport {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            total_executors: 0,
            online_executors: 0,
            version: UNKNOWN_VERSION.to_string(),
            stale_executors: Vec::new(),
            alarms_raised: 0,
            alarms_failed: 0,
        }
    }
}

/// Current docker / physical split of the known executors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetComposition {
    pub in_docker: u64,
    pub not_in_docker: u64,
}

/// Result of one namespace collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceData {
    pub namespace: String,
    pub name_and_namespace: String,
    /// `None` if the executor scan was aborted.
    pub executor_scan: Option<ExecutorScanReport>,
    pub jobs: Vec<JobStatistics>,
    pub failed_units: usize,
}

impl NamespaceData {
    pub fn new(namespace: impl Into<String>, name_and_namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name_and_namespace: name_and_namespace.into(),
            executor_scan: None,
            jobs: Vec::new(),
            failed_units: 0,
        }
    }

    pub fn process_count_of_the_day(&self) -> i64 {
        self.jobs.iter().map(|job| job.process_count_of_the_day).sum()
    }

    pub fn failure_count_of_the_day(&self) -> i64 {
        self.jobs.iter().map(|job| job.failure_count_of_the_day).sum()
    }
}

/// Fleet-wide snapshot of one collection cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedData {
    pub collection_start: DateTime<Utc>,
    pub collection_end: DateTime<Utc>,
    pub collection_duration_seconds: f64,
    pub namespaces: Vec<NamespaceData>,
    pub executors: Vec<ExecutorRecord>,
    pub versions: VersionCounters,
    pub exe_in_docker: u64,
    pub exe_not_in_docker: u64,
    pub composition: FleetComposition,
}

impl CollectedData {
    pub fn new(collection_start: DateTime<Utc>) -> Self {
        Self {
            collection_start,
            collection_end: collection_start,
            collection_duration_seconds: 0.0,
            namespaces: Vec::new(),
            executors: Vec::new(),
            versions: VersionCounters::default(),
            exe_in_docker: 0,
            exe_not_in_docker: 0,
            composition: FleetComposition::default(),
        }
    }

    pub fn finalize(&mut self) {
        self.collection_end = Utc::now();
        self.collection_duration_seconds =
            (self.collection_end - self.collection_start).num_milliseconds() as f64 / 1000.0;
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobStatistics> {
        self.namespaces.iter().flat_map(|namespace| namespace.jobs.iter())
    }

    pub fn process_count_of_the_day(&self) -> i64 {
        self.namespaces.iter().map(NamespaceData::process_count_of_the_day).sum()
    }

    pub fn failure_count_of_the_day(&self) -> i64 {
        self.namespaces.iter().map(NamespaceData::failure_count_of_the_day).sum()
    }

    pub fn stale_executors(&self) -> usize {
        self.namespaces
            .iter()
            .filter_map(|namespace| namespace.executor_scan.as_ref())
            .map(|scan| scan.stale_executors.len())
            .sum()
    }
}
