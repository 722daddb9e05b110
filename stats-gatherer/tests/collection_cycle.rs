mod common;

use common::*;
use fleet_health_stats_gatherer::{
    Clock,
    Collector,
    ExecutorKey,
    Orchestrator,
    RegistrySnapshot,
    UNKNOWN_VERSION,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use temp_dir::TempDir;

const SNAPSHOT: &str = r#"
captured_at: 2026-10-19T12:00:00Z
namespaces:
  payments:
    name_and_namespace: Payments/payments
    nodes:
      /$SaturnExecutors/executors/exec-a/ip: 10.0.0.1
      /$SaturnExecutors/executors/exec-a/version: "3.1.0"
      /$SaturnExecutors/executors/exec-a/task: { value: null }
      /$SaturnExecutors/executors/exec-b/ip: 10.0.0.2
      /$SaturnExecutors/executors/exec-b/noTraffic: { created: 2026-10-18T06:00:00Z }
      /$Jobs/settle/config/enabled: true
      /$Jobs/settle/config/loadLevel: 2
      /$Jobs/settle/servers/exec-a/status: { value: null }
      /$Jobs/settle/servers/exec-a/sharding: "0,1,2"
      /$Jobs/settle/servers/exec-a/processSuccessCount: 120
      /$Jobs/settle/servers/exec-a/processFailureCount: 3
      /$Jobs/settle/servers/exec-b/status: { value: null }
      /$Jobs/settle/servers/exec-b/sharding: ""
      /$Jobs/refund/config/enabled: false
      /$Jobs/refund/config/loadLevel: 5
      /$Jobs/refund/servers/exec-b/status: { value: null }
      /$Jobs/refund/servers/exec-b/sharding: "0"
      /$Jobs/refund/servers/exec-b/processSuccessCount: 8
  reports:
    nodes: {}
"#;

fn fixed_clock() -> Clock {
    Arc::new(now)
}

fn load_targets() -> Vec<fleet_health_stats_gatherer::NamespaceTarget> {
    let dir = TempDir::new().unwrap();
    let path = dir.child("registry.yaml");
    std::fs::write(&path, SNAPSHOT).unwrap();
    RegistrySnapshot::load(&path).unwrap().into_targets().unwrap()
}

#[tokio::test]
async fn snapshot_file_drives_a_full_cycle() {
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = Orchestrator::new(load_targets(), sink.clone()).with_clock(fixed_clock());

    orchestrator.collect(now()).await.unwrap();
    let data = orchestrator.data().unwrap();

    assert_eq!(data.namespaces.len(), 2);
    assert_eq!(data.namespaces[0].namespace, "payments");
    assert_eq!(data.namespaces[0].name_and_namespace, "Payments/payments");
    assert_eq!(data.namespaces[1].name_and_namespace, "reports");
    assert!(data.namespaces.iter().all(|namespace| namespace.failed_units == 0));

    assert_eq!(data.versions.domain_number.get("3.1.0"), Some(&1));
    assert_eq!(data.versions.domain_number.get(UNKNOWN_VERSION), Some(&1));
    assert_eq!(data.versions.executor_number.get("3.1.0"), Some(&2));
    assert_eq!(data.versions.executor_number.get(UNKNOWN_VERSION), None);

    let exec_a = data
        .executors
        .iter()
        .find(|record| record.key() == ExecutorKey::new("exec-a", "payments"))
        .unwrap();
    assert_eq!(exec_a.load_level, 6);
    assert!(exec_a.run_in_docker);
    assert_eq!(exec_a.process_count_today, 123);
    assert_eq!(exec_a.failure_count_today, 3);

    let exec_b = data
        .executors
        .iter()
        .find(|record| record.key() == ExecutorKey::new("exec-b", "payments"))
        .unwrap();
    assert_eq!(exec_b.load_level, 0);
    assert_eq!(exec_b.process_count_today, 8);

    assert_eq!(data.process_count_of_the_day(), 131);
    assert_eq!(data.failure_count_of_the_day(), 3);
    assert_eq!(data.composition.in_docker, 1);
    assert_eq!(data.composition.not_in_docker, 1);

    assert_eq!(data.stale_executors(), 1);
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].executor_id, "exec-b");
    assert_eq!(events[0].namespace, "payments");
}

#[tokio::test]
async fn summary_exports_the_snapshot() {
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = Orchestrator::new(load_targets(), sink).with_clock(fixed_clock());
    orchestrator.collect(now()).await.unwrap();

    let summary = orchestrator.summary();

    assert_eq!(summary["versions"]["domain_number"]["3.1.0"], 1);
    assert_eq!(summary["docker"]["composition"]["in_docker"], 1);
    assert_eq!(summary["namespaces"][0]["jobs"][0]["job_name"], "refund");
    assert_eq!(summary["namespaces"][0]["jobs"][1]["job_name"], "settle");
    assert_eq!(summary["namespaces"][0]["jobs"][1]["load_level"], 2);

    let report = orchestrator.format();
    assert!(report.contains("exec-a"));
    assert!(report.contains("settle"));
}

#[tokio::test]
async fn failing_namespace_does_not_stop_the_others() {
    let healthy = online_namespace("ns-ok");
    let broken = target(
        "ns-broken",
        FailingRegistry::new(
            registry()
                .with_node("/$SaturnExecutors/executors/e1/ip", "10.0.0.9")
                .with_node("/$Jobs/j1/config/loadLevel", "1"),
            "/",
        ),
    );
    let mut orchestrator =
        Orchestrator::new(vec![healthy, broken], Arc::new(RecordingSink::default())).with_clock(fixed_clock());

    orchestrator.collect(now()).await.unwrap();
    let data = orchestrator.data().unwrap();

    let broken = data.namespaces.iter().find(|namespace| namespace.namespace == "ns-broken").unwrap();
    assert!(broken.executor_scan.is_none());
    assert_eq!(broken.failed_units, 2);

    let healthy = data.namespaces.iter().find(|namespace| namespace.namespace == "ns-ok").unwrap();
    assert_eq!(healthy.failed_units, 0);
    assert_eq!(healthy.jobs.len(), 1);
    assert_eq!(data.executors.len(), 1);
    assert_eq!(data.versions.domain_number.values().sum::<u64>(), 1);
}

#[tokio::test]
async fn failing_job_is_counted_and_skipped() {
    let inner = registry()
        .with_node("/$SaturnExecutors/executors/e1/ip", "10.0.0.1")
        .with_node("/$Jobs/good/config/enabled", "true")
        .with_marker("/$Jobs/good/servers/e1/status")
        .with_node("/$Jobs/good/servers/e1/sharding", "0")
        .with_node("/$Jobs/bad/config/enabled", "true")
        .with_marker("/$Jobs/bad/servers/e1/status");
    let target = target("ns1", FailingRegistry::new(inner, "/$Jobs/bad/servers"));
    let mut orchestrator =
        Orchestrator::new(vec![target], Arc::new(RecordingSink::default())).with_clock(fixed_clock());

    orchestrator.collect(now()).await.unwrap();
    let data = orchestrator.data().unwrap();

    assert_eq!(data.namespaces[0].failed_units, 1);
    assert_eq!(data.namespaces[0].jobs.len(), 1);
    assert_eq!(data.namespaces[0].jobs[0].job_name, "good");
    assert_eq!(data.executors[0].load_level, 1);
}

fn online_namespace(namespace: &str) -> fleet_health_stats_gatherer::NamespaceTarget {
    target(
        namespace,
        registry()
            .with_node("/$SaturnExecutors/executors/e1/ip", "10.0.0.1")
            .with_node("/$SaturnExecutors/executors/e1/version", "1.0")
            .with_node("/$Jobs/j1/config/enabled", "true")
            .with_marker("/$Jobs/j1/servers/e1/status")
            .with_node("/$Jobs/j1/servers/e1/sharding", "0"),
    )
}
