use super::FleetAnalyzer;
use crate::{
    alarm::{
        AlarmEvent,
        AlarmInfo,
    },
    metrics::{
        ExecutorKey,
        ExecutorRecord,
        ExecutorScanReport,
        UNKNOWN_VERSION,
    },
    registry::{
        paths::ExecutorPaths,
        NamespaceTarget,
        RegistryAccessor,
        RegistryError,
    },
};

impl FleetAnalyzer {
    /// Scans the executor subtree of one namespace.
    ///
    /// Registers online executors, classifies them as docker or physical, attributes the
    /// namespace to one software version and raises an alarm for every executor that has
    /// been traffic-drained for longer than the staleness threshold.
    ///
    /// Only registry failures abort the scan; whatever was merged until then stays.
    #[instrument(level = "debug", skip_all, fields(namespace = %target.namespace))]
    pub async fn analyze_executors(&self, target: &NamespaceTarget) -> Result<ExecutorScanReport, RegistryError> {
        let registry = target.registry.as_ref();
        let namespace = target.namespace.as_str();
        let mut report = ExecutorScanReport::new(namespace);

        let executors = if registry.exists(ExecutorPaths::root()).await? {
            registry.children(ExecutorPaths::root()).await?.unwrap_or_default()
        } else {
            Vec::new()
        };

        if executors.is_empty() {
            debug!(namespace, "no executors registered");
            self.add_version_number(UNKNOWN_VERSION, 0);
            return Ok(report);
        }

        let mut version = None;
        for executor in &executors {
            if is_online(registry, executor).await? {
                report.online_executors += 1;
                self.register_online_executor(target, executor).await?;
            }
            if version.is_none() {
                version = read_version(registry, executor).await;
            }
        }

        report.total_executors = executors.len() as u64;
        report.version = version.unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        self.add_version_number(&report.version, report.total_executors);

        report.stale_executors = self.find_stale_executors(registry, &executors).await?;
        self.raise_no_traffic_alarms(namespace, &mut report).await;

        debug!(
            namespace,
            total = report.total_executors,
            online = report.online_executors,
            version = %report.version,
            stale = report.stale_executors.len(),
            "executor scan finished"
        );
        Ok(report)
    }

    async fn register_online_executor(&self, target: &NamespaceTarget, executor: &str) -> Result<(), RegistryError> {
        let registry = target.registry.as_ref();
        let key = ExecutorKey::new(executor, &target.namespace);

        let ip = if self.contains_executor(&key) {
            None
        } else {
            read_ip(registry, executor).await
        };
        let in_docker = is_in_docker(registry, executor).await?;

        self.update_executor(
            &key,
            || {
                let mut record = ExecutorRecord::new(&key, &target.name_and_namespace);
                record.ip = ip;
                record
            },
            |record, _| record.run_in_docker = in_docker,
        );
        self.count_docker_observation(in_docker);
        Ok(())
    }

    async fn find_stale_executors(
        &self,
        registry: &dyn RegistryAccessor,
        executors: &[String],
    ) -> Result<Vec<String>, RegistryError> {
        let now = self.now();
        let mut stale = Vec::new();

        for executor in executors {
            if !is_online(registry, executor).await? || !is_no_traffic(registry, executor).await? {
                continue;
            }
            match registry.stat(&ExecutorPaths::no_traffic(executor)).await? {
                Some(stat) if self.staleness.is_stale(stat.created, now) => stale.push(executor.clone()),
                Some(_) => {}
                None => debug!(executor, "traffic marker vanished while scanning"),
            }
        }

        Ok(stale)
    }

    async fn raise_no_traffic_alarms(&self, namespace: &str, report: &mut ExecutorScanReport) {
        for executor in &report.stale_executors {
            let info = AlarmInfo::executor_no_traffic(namespace, executor, self.staleness.threshold());
            match self.alarm_sink.raise(AlarmEvent::for_executor(namespace, executor, info)).await {
                Ok(()) => report.alarms_raised += 1,
                Err(e) => {
                    warn!(namespace, executor, %e, "fail to raise alarm");
                    report.alarms_failed += 1;
                }
            }
        }
    }
}

async fn is_online(registry: &dyn RegistryAccessor, executor: &str) -> Result<bool, RegistryError> {
    registry.exists(&ExecutorPaths::ip(executor)).await
}

async fn is_no_traffic(registry: &dyn RegistryAccessor, executor: &str) -> Result<bool, RegistryError> {
    registry.exists(&ExecutorPaths::no_traffic(executor)).await
}

pub(super) async fn is_in_docker(registry: &dyn RegistryAccessor, executor: &str) -> Result<bool, RegistryError> {
    registry.exists(&ExecutorPaths::task(executor)).await
}

/// IP of the executor; read failures degrade to unknown.
pub(super) async fn read_ip(registry: &dyn RegistryAccessor, executor: &str) -> Option<String> {
    match registry.read(&ExecutorPaths::ip(executor)).await {
        Ok(ip) => ip.filter(|ip| !ip.trim().is_empty()),
        Err(e) => {
            warn!(executor, %e, "failed to read executor ip");
            None
        }
    }
}

/// Version reported by the executor; blank values and read failures count as unreadable.
async fn read_version(registry: &dyn RegistryAccessor, executor: &str) -> Option<String> {
    match registry.read(&ExecutorPaths::version(executor)).await {
        Ok(version) => version
            .map(|version| version.trim().to_string())
            .filter(|version| !version.is_empty()),
        Err(e) => {
            warn!(executor, %e, "failed to read executor version");
            None
        }
    }
}
