use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// Unique identity of an executor record: the same executor id seen in two namespaces
/// yields two records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutorKey {
    pub executor_id: String,
    pub namespace: String,
}

impl ExecutorKey {
    pub fn new(executor_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            executor_id: executor_id.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ExecutorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.executor_id, self.namespace)
    }
}

/// Shards of one job carried by an executor and the load they contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardAssignment {
    pub job: String,
    pub shards: String,
    pub load: i64,
}

/// Statistics of one executor within one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorRecord {
    pub executor_id: String,
    pub namespace: String,
    pub name_and_namespace: String,
    pub ip: Option<String>,
    pub run_in_docker: bool,
    pub process_count_today: i64,
    pub failure_count_today: i64,
    pub load_level: i64,
    pub job_and_shardings: Vec<ShardAssignment>,
}

impl ExecutorRecord {
    pub fn new(key: &ExecutorKey, name_and_namespace: impl Into<String>) -> Self {
        Self {
            executor_id: key.executor_id.clone(),
            namespace: key.namespace.clone(),
            name_and_namespace: name_and_namespace.into(),
            ip: None,
            run_in_docker: false,
            process_count_today: 0,
            failure_count_today: 0,
            load_level: 0,
            job_and_shardings: Vec::new(),
        }
    }

    pub fn key(&self) -> ExecutorKey {
        ExecutorKey::new(&self.executor_id, &self.namespace)
    }

    pub fn add_process_counts(&mut self, success: i64, failure: i64) {
        self.process_count_today += success + failure;
        self.failure_count_today += failure;
    }

    pub fn has_assignment(&self, job: &str) -> bool {
        self.job_and_shardings.iter().any(|assignment| assignment.job == job)
    }

    /// Records the shards of `job` and raises the load level by `load`.
    ///
    /// A job contributes at most once; returns `false` if it already did.
    pub fn add_assignment(&mut self, job: &str, shards: &str, load: i64) -> bool {
        if self.has_assignment(job) {
            return false;
        }
        self.job_and_shardings.push(ShardAssignment {
            job: job.to_string(),
            shards: shards.to_string(),
            load,
        });
        self.load_level = self.load_level.saturating_add(load);
        true
    }

    pub fn failure_rate(&self) -> f64 {
        if self.process_count_today == 0 {
            0.0
        } else {
            self.failure_count_today as f64 / self.process_count_today as f64
        }
    }

    /// Flat `job:shards;` text used in reports, `None` if no job assigned shards yet.
    pub fn render_job_and_shardings(&self) -> Option<String> {
        if self.job_and_shardings.is_empty() {
            return None;
        }
        Some(
            self.job_and_shardings
                .iter()
                .map(|assignment| format!("{}:{};", assignment.job, assignment.shards))
                .collect(),
        )
    }
}
