//! # Analyzer Module
//!
//! The shared aggregation context of one collection cycle.
//!
//! A [`FleetAnalyzer`] is created by the caller that drives a cycle and handed (behind an
//! `Arc`) to every scan unit: one executor scan per namespace and one server scan per
//! job. Units run concurrently and merge their observations into the same maps:
//!
//! - executor records live in a `DashMap`, each read-modify-write happens under the
//!   entry guard of its key and never across an `.await`
//! - both version tallies sit behind one mutex, so a namespace's version update is a
//!   single critical section
//! - docker / non-docker tallies are plain atomics
//!
//! Every contribution is additive and never retracted. Readers take copies through the
//! accessors at any time without blocking the scanners for long.

mod executor_scan;
pub(crate) mod parse;
mod server_scan;
mod staleness;

pub use staleness::StalenessDetector;

use crate::{
    alarm::AlarmSink,
    metrics::{
        ExecutorKey,
        ExecutorRecord,
        FleetComposition,
        VersionCounters,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use dashmap::DashMap;
use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
    time::Duration,
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct FleetAnalyzer {
    executors: DashMap<ExecutorKey, ExecutorRecord>,
    versions: Mutex<VersionCounters>,
    exe_in_docker: AtomicU64,
    exe_not_in_docker: AtomicU64,
    staleness: StalenessDetector,
    clock: Clock,
    alarm_sink: Arc<dyn AlarmSink>,
}

impl fmt::Debug for FleetAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetAnalyzer")
            .field("executor_count", &self.executors.len())
            .field("exe_in_docker", &self.exe_in_docker())
            .field("exe_not_in_docker", &self.exe_not_in_docker())
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

impl FleetAnalyzer {
    pub fn new(alarm_sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            executors: DashMap::new(),
            versions: Mutex::new(VersionCounters::default()),
            exe_in_docker: AtomicU64::new(0),
            exe_not_in_docker: AtomicU64::new(0),
            staleness: StalenessDetector::default(),
            clock: Arc::new(Utc::now),
            alarm_sink,
        }
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness = StalenessDetector::new(threshold);
        self
    }

    /// Replaces the wall clock used to age traffic-drained markers.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn staleness(&self) -> &StalenessDetector {
        &self.staleness
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Counts one namespace scan for `version`, weighted by the namespace's executor count.
    pub fn add_version_number(&self, version: &str, executor_count: u64) {
        self.lock_versions().add(version, executor_count);
    }

    /// Copy of all executor records, ordered by executor id and namespace.
    pub fn executor_list(&self) -> Vec<ExecutorRecord> {
        let mut records = self
            .executors
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            (&a.executor_id, &a.namespace).cmp(&(&b.executor_id, &b.namespace))
        });
        records
    }

    pub fn executor(&self, key: &ExecutorKey) -> Option<ExecutorRecord> {
        self.executors.get(key).map(|entry| entry.value().clone())
    }

    pub fn executor_count(&self) -> usize {
        self.executors.len()
    }

    pub fn version_counters(&self) -> VersionCounters {
        self.lock_versions().clone()
    }

    pub fn version_domain_number(&self) -> BTreeMap<String, u64> {
        self.lock_versions().domain_number.clone()
    }

    pub fn version_executor_number(&self) -> BTreeMap<String, u64> {
        self.lock_versions().executor_number.clone()
    }

    /// Cumulative number of in-docker observations, not a count of current executors.
    pub fn exe_in_docker(&self) -> u64 {
        self.exe_in_docker.load(Ordering::Relaxed)
    }

    /// Cumulative number of physical-host observations.
    pub fn exe_not_in_docker(&self) -> u64 {
        self.exe_not_in_docker.load(Ordering::Relaxed)
    }

    /// Current docker / physical split of the known executor records.
    pub fn fleet_composition(&self) -> FleetComposition {
        self.executors
            .iter()
            .fold(FleetComposition::default(), |mut composition, entry| {
                if entry.value().run_in_docker {
                    composition.in_docker += 1;
                } else {
                    composition.not_in_docker += 1;
                }
                composition
            })
    }

    fn lock_versions(&self) -> MutexGuard<'_, VersionCounters> {
        self.versions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn contains_executor(&self, key: &ExecutorKey) -> bool {
        self.executors.contains_key(key)
    }

    fn count_docker_observation(&self, in_docker: bool) {
        if in_docker {
            self.exe_in_docker.fetch_add(1, Ordering::Relaxed);
        } else {
            self.exe_not_in_docker.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Fetches or creates the record for `key` and applies `update` while holding its
    /// entry guard. `update` learns whether the record was created by this call.
    fn update_executor<R>(
        &self,
        key: &ExecutorKey,
        seed: impl FnOnce() -> ExecutorRecord,
        update: impl FnOnce(&mut ExecutorRecord, bool) -> R,
    ) -> R {
        let mut created = false;
        let mut record = self.executors.entry(key.clone()).or_insert_with(|| {
            created = true;
            seed()
        });
        update(record.value_mut(), created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::LoggingAlarmSink;
    use std::thread;

    fn analyzer() -> FleetAnalyzer {
        FleetAnalyzer::new(Arc::new(LoggingAlarmSink))
    }

    #[test]
    fn concurrent_version_updates_are_not_lost() {
        let analyzer = Arc::new(analyzer());
        let handles = (0..8)
            .map(|_| {
                let analyzer = analyzer.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        analyzer.add_version_number("1.2", 3);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(analyzer.version_domain_number().get("1.2"), Some(&8000));
        assert_eq!(analyzer.version_executor_number().get("1.2"), Some(&24000));
    }

    #[test]
    fn concurrent_creation_converges_to_one_record() {
        let analyzer = Arc::new(analyzer());
        let key = ExecutorKey::new("e1", "ns1");
        let handles = (0..8)
            .map(|_| {
                let analyzer = analyzer.clone();
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        analyzer.update_executor(
                            &key,
                            || ExecutorRecord::new(&key, "ns1"),
                            |record, _| record.add_process_counts(1, 1),
                        );
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(analyzer.executor_count(), 1);
        let record = analyzer.executor(&key).unwrap();
        assert_eq!(record.process_count_today, 1600);
        assert_eq!(record.failure_count_today, 800);
    }

    #[test]
    fn composition_is_derived_from_records() {
        let analyzer = analyzer();
        for (id, docker) in [("e1", true), ("e2", false), ("e3", true)] {
            let key = ExecutorKey::new(id, "ns1");
            analyzer.update_executor(&key, || ExecutorRecord::new(&key, "ns1"), |record, _| {
                record.run_in_docker = docker
            });
        }

        assert_eq!(
            analyzer.fleet_composition(),
            FleetComposition {
                in_docker: 2,
                not_in_docker: 1,
            }
        );
        // Tallies only move with scans.
        assert_eq!(analyzer.exe_in_docker(), 0);
        assert_eq!(analyzer.exe_not_in_docker(), 0);
    }
}
