use serde::{
    Deserialize,
    Serialize,
};

/// Shards of a job observed on one executor during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorShards {
    pub executor_id: String,
    pub shards: String,
}

/// Per-job counters of a single scan pass, owned by whoever drives the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatistics {
    pub job_name: String,
    pub namespace: String,
    pub name_and_namespace: String,
    /// Configured load weight of one shard of this job.
    pub load_level: i64,
    pub process_count_of_the_day: i64,
    pub failure_count_of_the_day: i64,
    pub executors_and_shards: Vec<ExecutorShards>,
}

impl JobStatistics {
    pub fn new(
        job_name: impl Into<String>,
        namespace: impl Into<String>,
        name_and_namespace: impl Into<String>,
        load_level: i64,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            namespace: namespace.into(),
            name_and_namespace: name_and_namespace.into(),
            load_level,
            process_count_of_the_day: 0,
            failure_count_of_the_day: 0,
            executors_and_shards: Vec::new(),
        }
    }

    pub fn incr_process_count_of_the_day(&mut self, count: i64) {
        self.process_count_of_the_day += count;
    }

    pub fn incr_failure_count_of_the_day(&mut self, count: i64) {
        self.failure_count_of_the_day += count;
    }

    pub fn add_executor_shards(&mut self, executor_id: &str, shards: &str) {
        self.executors_and_shards.push(ExecutorShards {
            executor_id: executor_id.to_string(),
            shards: shards.to_string(),
        });
    }

    pub fn failure_rate(&self) -> f64 {
        if self.process_count_of_the_day == 0 {
            0.0
        } else {
            self.failure_count_of_the_day as f64 / self.process_count_of_the_day as f64
        }
    }

    /// Flat `executor:shards; ` text used in reports.
    pub fn render_executors_and_shards(&self) -> Option<String> {
        if self.executors_and_shards.is_empty() {
            return None;
        }
        Some(
            self.executors_and_shards
                .iter()
                .map(|entry| format!("{}:{}; ", entry.executor_id, entry.shards))
                .collect(),
        )
    }
}
