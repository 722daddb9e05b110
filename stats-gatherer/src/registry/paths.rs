//! Node paths of the executor and job subtrees.

pub const EXECUTORS_ROOT: &str = "/$SaturnExecutors/executors";
pub const JOBS_ROOT: &str = "/$Jobs";

pub const CONFIG_ENABLED: &str = "enabled";
pub const CONFIG_LOAD_LEVEL: &str = "loadLevel";

pub struct ExecutorPaths;

impl ExecutorPaths {
    pub fn root() -> &'static str {
        EXECUTORS_ROOT
    }

    pub fn executor(executor: &str) -> String {
        format!("{EXECUTORS_ROOT}/{executor}")
    }

    /// Ephemeral node holding the executor's IP. Its presence means the executor is online.
    pub fn ip(executor: &str) -> String {
        format!("{EXECUTORS_ROOT}/{executor}/ip")
    }

    pub fn version(executor: &str) -> String {
        format!("{EXECUTORS_ROOT}/{executor}/version")
    }

    /// Marker written when the executor is drained of traffic.
    pub fn no_traffic(executor: &str) -> String {
        format!("{EXECUTORS_ROOT}/{executor}/noTraffic")
    }

    /// Marker only executors running inside a container task carry.
    pub fn task(executor: &str) -> String {
        format!("{EXECUTORS_ROOT}/{executor}/task")
    }
}

pub struct JobPaths;

impl JobPaths {
    pub fn root() -> &'static str {
        JOBS_ROOT
    }

    pub fn config(job: &str, key: &str) -> String {
        format!("{JOBS_ROOT}/{job}/config/{key}")
    }

    pub fn servers(job: &str) -> String {
        format!("{JOBS_ROOT}/{job}/servers")
    }

    pub fn server_status(job: &str, server: &str) -> String {
        format!("{JOBS_ROOT}/{job}/servers/{server}/status")
    }

    pub fn process_success_count(job: &str, server: &str) -> String {
        format!("{JOBS_ROOT}/{job}/servers/{server}/processSuccessCount")
    }

    pub fn process_failure_count(job: &str, server: &str) -> String {
        format!("{JOBS_ROOT}/{job}/servers/{server}/processFailureCount")
    }

    pub fn server_sharding(job: &str, server: &str) -> String {
        format!("{JOBS_ROOT}/{job}/servers/{server}/sharding")
    }
}
