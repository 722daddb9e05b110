use super::{
    executor_scan::{
        is_in_docker,
        read_ip,
    },
    parse::{
        count_shards,
        parse_counter,
        parse_enabled,
    },
    FleetAnalyzer,
};
use crate::{
    metrics::{
        ExecutorKey,
        ExecutorRecord,
        JobStatistics,
    },
    registry::{
        paths::{
            JobPaths,
            CONFIG_ENABLED,
        },
        NamespaceTarget,
        RegistryError,
    },
};

impl FleetAnalyzer {
    /// Scans the servers of one job.
    ///
    /// For every server taking part in the job this adds the server's success and
    /// failure counters to `job_statistics` and to the executor record, then, for an
    /// enabled job, raises the executor's load level by `load_level` per assigned shard.
    ///
    /// A failure while handling one server is logged and does not affect the others.
    /// Only a failing participation check aborts the scan.
    #[instrument(level = "debug", skip_all, fields(namespace = %target.namespace, job = %job))]
    pub async fn analyze_servers(
        &self,
        target: &NamespaceTarget,
        job: &str,
        load_level: i64,
        servers: &[String],
        job_statistics: &mut JobStatistics,
    ) -> Result<(), RegistryError> {
        let registry = target.registry.as_ref();
        let load_level = if load_level < 0 {
            warn!(load_level, "negative load level, job adds no load");
            0
        } else {
            load_level
        };

        for server in servers {
            if !registry.exists(&JobPaths::server_status(job, server)).await? {
                debug!(server, "server does not take part in job");
                continue;
            }

            if let Err(e) = self.calc_job_process_count(target, job, server, job_statistics).await {
                warn!(server, %e, "failed to count processed items");
            }

            if let Err(e) = self.calc_load_level(target, job, server, load_level, job_statistics).await {
                warn!(server, %e, "failed to compute load level");
            }
        }

        Ok(())
    }

    /// Creates the record of an executor first seen by a job scan.
    ///
    /// IP and docker placement are read once, at creation, and the placement is counted
    /// as an observation only by the call that actually inserted the record.
    async fn register_job_executor(&self, target: &NamespaceTarget, server: &str) -> Result<ExecutorKey, RegistryError> {
        let key = ExecutorKey::new(server, &target.namespace);
        if self.contains_executor(&key) {
            return Ok(key);
        }

        let registry = target.registry.as_ref();
        let in_docker = is_in_docker(registry, server).await?;
        let ip = read_ip(registry, server).await;

        let created = self.update_executor(
            &key,
            || {
                let mut record = ExecutorRecord::new(&key, &target.name_and_namespace);
                record.ip = ip;
                record.run_in_docker = in_docker;
                record
            },
            |_, created| created,
        );
        if created {
            self.count_docker_observation(in_docker);
        }
        Ok(key)
    }

    async fn calc_job_process_count(
        &self,
        target: &NamespaceTarget,
        job: &str,
        server: &str,
        job_statistics: &mut JobStatistics,
    ) -> Result<(), RegistryError> {
        let registry = target.registry.as_ref();

        let success_path = JobPaths::process_success_count(job, server);
        let failure_path = JobPaths::process_failure_count(job, server);
        let success = parse_counter(&success_path, registry.read(&success_path).await?.as_deref());
        let failure = parse_counter(&failure_path, registry.read(&failure_path).await?.as_deref());

        let key = self.register_job_executor(target, server).await?;
        self.update_executor(
            &key,
            || ExecutorRecord::new(&key, &target.name_and_namespace),
            |record, _| record.add_process_counts(success, failure),
        );

        job_statistics.incr_process_count_of_the_day(success + failure);
        job_statistics.incr_failure_count_of_the_day(failure);
        Ok(())
    }

    async fn calc_load_level(
        &self,
        target: &NamespaceTarget,
        job: &str,
        server: &str,
        load_level: i64,
        job_statistics: &mut JobStatistics,
    ) -> Result<(), RegistryError> {
        let registry = target.registry.as_ref();

        let enabled_path = JobPaths::config(job, CONFIG_ENABLED);
        if !parse_enabled(&enabled_path, registry.read(&enabled_path).await?.as_deref()) {
            return Ok(());
        }

        let Some(sharding) = registry
            .read(&JobPaths::server_sharding(job, server))
            .await?
            .filter(|sharding| !sharding.is_empty())
        else {
            return Ok(());
        };

        job_statistics.add_executor_shards(server, &sharding);

        let key = self.register_job_executor(target, server).await?;
        let load = load_level.saturating_mul(count_shards(&sharding));

        let contributed = self.update_executor(
            &key,
            || ExecutorRecord::new(&key, &target.name_and_namespace),
            |record, _| record.add_assignment(job, &sharding, load),
        );

        if !contributed {
            debug!(server, "job already contributed to executor load");
        }
        Ok(())
    }
}
