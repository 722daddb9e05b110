use crate::{
    alarm::AlarmSink,
    analyzer::{
        Clock,
        FleetAnalyzer,
        StalenessDetector,
    },
    collectors::{
        Collector,
        NamespaceCollector,
    },
    metrics::*,
    registry::NamespaceTarget,
};
use chrono::{
    DateTime,
    Utc,
};
use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use eyre::Result;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinSet;

/// Runs a collection cycle over all namespaces and renders the fleet report.
///
/// Each call to [`Collector::collect`] starts from a fresh [`FleetAnalyzer`], so the
/// snapshot of a cycle reflects exactly the registry state that cycle observed.
pub struct Orchestrator {
    targets: Vec<NamespaceTarget>,
    alarm_sink: Arc<dyn AlarmSink>,
    staleness_threshold: Duration,
    clock: Option<Clock>,
    analyzer: Option<Arc<FleetAnalyzer>>,
    metrics: Option<CollectedData>,
}

impl Orchestrator {
    pub fn new(targets: Vec<NamespaceTarget>, alarm_sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            targets,
            alarm_sink,
            staleness_threshold: StalenessDetector::DEFAULT_THRESHOLD,
            clock: None,
            analyzer: None,
            metrics: None,
        }
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn targets(&self) -> &[NamespaceTarget] {
        &self.targets
    }

    /// Aggregation context of the last cycle.
    pub fn analyzer(&self) -> Option<&Arc<FleetAnalyzer>> {
        self.analyzer.as_ref()
    }

    pub fn data(&self) -> Option<&CollectedData> {
        self.metrics.as_ref()
    }

    fn new_analyzer(&self) -> FleetAnalyzer {
        let analyzer =
            FleetAnalyzer::new(self.alarm_sink.clone()).with_staleness_threshold(self.staleness_threshold);
        match &self.clock {
            Some(clock) => {
                let clock = clock.clone();
                analyzer.with_clock(move || clock())
            }
            None => analyzer,
        }
    }

    fn format_summary(&self, metrics: &CollectedData) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("🛰️  FLEET SUMMARY").add_attribute(Attribute::Bold).fg(Color::Cyan),
                Cell::new(""),
            ]);

        let rows = [
            ("Namespaces", metrics.namespaces.len().to_string()),
            ("Executors", metrics.executors.len().to_string()),
            ("Jobs", metrics.jobs().count().to_string()),
            ("Processed Today", metrics.process_count_of_the_day().to_string()),
            ("Failed Today", metrics.failure_count_of_the_day().to_string()),
            (
                "In Docker / Physical",
                format!("{} / {}", metrics.composition.in_docker, metrics.composition.not_in_docker),
            ),
            (
                "Docker Observations",
                format!("{} / {}", metrics.exe_in_docker, metrics.exe_not_in_docker),
            ),
        ];
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
        }

        let stale = metrics.stale_executors();
        table.add_row(vec![
            Cell::new("No Traffic Alarms").add_attribute(Attribute::Bold),
            Cell::new(stale.to_string()).fg(if stale == 0 { Color::Green } else { Color::Red }),
        ]);

        let failed_units = metrics.namespaces.iter().map(|namespace| namespace.failed_units).sum::<usize>();
        if failed_units > 0 {
            table.add_row(vec![
                Cell::new("Failed Units").add_attribute(Attribute::Bold),
                Cell::new(failed_units.to_string()).fg(Color::Red),
            ]);
        }

        format!("{}\n", table)
    }

    fn format_versions(&self, versions: &VersionCounters) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Version").add_attribute(Attribute::Bold).fg(Color::Cyan),
                Cell::new("Namespaces").add_attribute(Attribute::Bold).fg(Color::Cyan),
                Cell::new("Executors").add_attribute(Attribute::Bold).fg(Color::Cyan),
            ]);

        for (version, domains) in &versions.domain_number {
            let executors = versions.executor_number.get(version).copied().unwrap_or(0);
            let version_cell = if version == UNKNOWN_VERSION {
                Cell::new("unknown").fg(Color::Yellow)
            } else {
                Cell::new(version)
            };
            table.add_row(vec![version_cell, Cell::new(domains), Cell::new(executors)]);
        }

        format!("{}\n", table)
    }

    fn format_executors(&self, executors: &[ExecutorRecord]) -> String {
        let mut executors = executors.iter().collect::<Vec<_>>();
        executors.sort_by(|a, b| b.load_level.cmp(&a.load_level).then_with(|| a.key().cmp(&b.key())));

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                ["Executor", "Namespace", "IP", "Docker", "Load", "Processed", "Failed", "Jobs"]
                    .into_iter()
                    .map(|title| Cell::new(title).add_attribute(Attribute::Bold).fg(Color::Cyan)),
            );

        for executor in executors {
            table.add_row(vec![
                Cell::new(&executor.executor_id),
                Cell::new(&executor.namespace),
                Cell::new(executor.ip.as_deref().unwrap_or("-")),
                Cell::new(if executor.run_in_docker { "yes" } else { "no" }),
                Cell::new(executor.load_level),
                Cell::new(executor.process_count_today),
                Cell::new(executor.failure_count_today).fg(failure_color(executor.failure_rate())),
                Cell::new(executor.render_job_and_shardings().unwrap_or_default()),
            ]);
        }

        format!("{}\n", table)
    }

    fn format_jobs(&self, metrics: &CollectedData) -> String {
        let mut jobs = metrics.jobs().collect::<Vec<_>>();
        jobs.sort_by(|a, b| {
            b.process_count_of_the_day
                .cmp(&a.process_count_of_the_day)
                .then_with(|| (&a.namespace, &a.job_name).cmp(&(&b.namespace, &b.job_name)))
        });

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                ["Job", "Namespace", "Load Level", "Processed", "Failed", "Failure Rate", "Shards"]
                    .into_iter()
                    .map(|title| Cell::new(title).add_attribute(Attribute::Bold).fg(Color::Cyan)),
            );

        for job in jobs {
            table.add_row(vec![
                Cell::new(&job.job_name),
                Cell::new(&job.namespace),
                Cell::new(job.load_level),
                Cell::new(job.process_count_of_the_day),
                Cell::new(job.failure_count_of_the_day),
                Cell::new(format!("{:.1}%", job.failure_rate() * 100.0)).fg(failure_color(job.failure_rate())),
                Cell::new(job.render_executors_and_shards().unwrap_or_default()),
            ]);
        }

        format!("{}\n", table)
    }
}

fn failure_color(rate: f64) -> Color {
    if rate >= 0.1 {
        Color::Red
    } else if rate > 0.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

impl Collector for Orchestrator {
    fn collect(&mut self, start_time: DateTime<Utc>) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let analyzer = Arc::new(self.new_analyzer());
            let mut collected_data = CollectedData::new(start_time);

            let mut units = JoinSet::new();
            for target in self.targets.iter().cloned() {
                let mut collector = NamespaceCollector::new(target, analyzer.clone());
                units.spawn(async move {
                    let result = collector.collect(start_time).await;
                    result.map(|()| collector.into_data())
                });
            }

            while let Some(joined) = units.join_next().await {
                match joined {
                    Ok(Ok(Some(data))) => collected_data.namespaces.push(data),
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => error!(%e, "namespace collection failed"),
                    Err(e) => error!(%e, "namespace collection task failed"),
                }
            }
            collected_data
                .namespaces
                .sort_by(|a, b| a.namespace.cmp(&b.namespace));

            collected_data.executors = analyzer.executor_list();
            collected_data.versions = analyzer.version_counters();
            collected_data.exe_in_docker = analyzer.exe_in_docker();
            collected_data.exe_not_in_docker = analyzer.exe_not_in_docker();
            collected_data.composition = analyzer.fleet_composition();
            collected_data.finalize();

            info!(
                namespaces = collected_data.namespaces.len(),
                executors = collected_data.executors.len(),
                duration_seconds = collected_data.collection_duration_seconds,
                "collection cycle finished"
            );

            self.analyzer = Some(analyzer);
            self.metrics = Some(collected_data);
            Ok(())
        })
    }

    fn format(&self) -> String {
        let Some(metrics) = &self.metrics else {
            return "No metrics collected yet\n".to_string();
        };

        let mut report = String::new();

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "🚀 EXECUTOR FLEET HEALTH REPORT"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        report.push_str(&format!(
            "\n📊 Collection Summary:\n\
            • Collection Time: {}\n\
            • Duration: {:.1} seconds\n\n",
            metrics.collection_start.format("%Y-%m-%d %H:%M:%S UTC"),
            metrics.collection_duration_seconds
        ));

        report.push_str(&self.format_summary(metrics));
        report.push_str("\n🏷️  Versions:\n");
        report.push_str(&self.format_versions(&metrics.versions));

        if !metrics.executors.is_empty() {
            report.push_str("\n🖥️  Executors:\n");
            report.push_str(&self.format_executors(&metrics.executors));
        }
        if metrics.jobs().next().is_some() {
            report.push_str("\n⚙️  Jobs:\n");
            report.push_str(&self.format_jobs(metrics));
        }

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "✅ END OF REPORT"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        report
    }

    fn summary(&self) -> serde_json::Value {
        let Some(metrics) = &self.metrics else {
            return serde_json::Value::Null;
        };

        serde_json::json!({
            "collection_info": {
                "start_time": metrics.collection_start,
                "end_time": metrics.collection_end,
                "duration_seconds": metrics.collection_duration_seconds,
            },
            "versions": {
                "domain_number": metrics.versions.domain_number,
                "executor_number": metrics.versions.executor_number,
            },
            "docker": {
                "exe_in_docker": metrics.exe_in_docker,
                "exe_not_in_docker": metrics.exe_not_in_docker,
                "composition": metrics.composition,
            },
            "executors": metrics.executors,
            "namespaces": metrics.namespaces,
        })
    }

    fn name(&self) -> &'static str {
        "Orchestrator"
    }
}
