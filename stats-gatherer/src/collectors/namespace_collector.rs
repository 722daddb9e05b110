use crate::{
    analyzer::{
        parse::parse_load_level,
        FleetAnalyzer,
    },
    collectors::Collector,
    metrics::*,
    registry::{
        paths::{
            JobPaths,
            CONFIG_LOAD_LEVEL,
        },
        NamespaceTarget,
        RegistryError,
    },
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
};
use tokio::task::JoinSet;

/// Scans one namespace: the executor subtree first, then every job concurrently.
pub struct NamespaceCollector {
    target: NamespaceTarget,
    analyzer: Arc<FleetAnalyzer>,
    metrics: Option<NamespaceData>,
}

impl NamespaceCollector {
    pub fn new(target: NamespaceTarget, analyzer: Arc<FleetAnalyzer>) -> Self {
        Self {
            target,
            analyzer,
            metrics: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.target.namespace
    }

    pub fn data(&self) -> Option<&NamespaceData> {
        self.metrics.as_ref()
    }

    pub fn into_data(self) -> Option<NamespaceData> {
        self.metrics
    }

    /// Runs one server scan per job. Failed jobs are counted, the rest are kept.
    async fn scan_jobs(&self, data: &mut NamespaceData) -> Result<(), RegistryError> {
        let jobs = self
            .target
            .registry
            .children(JobPaths::root())
            .await?
            .unwrap_or_default();

        let mut units = JoinSet::new();
        for job in jobs {
            let analyzer = self.analyzer.clone();
            let target = self.target.clone();
            units.spawn(async move { scan_job(analyzer, target, job).await });
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(Some(statistics)) => data.jobs.push(statistics),
                Ok(None) => data.failed_units += 1,
                Err(e) => {
                    error!(namespace = %self.target.namespace, %e, "job scan task failed");
                    data.failed_units += 1;
                }
            }
        }

        data.jobs.sort_by(|a, b| a.job_name.cmp(&b.job_name));
        Ok(())
    }
}

async fn scan_job(analyzer: Arc<FleetAnalyzer>, target: NamespaceTarget, job: String) -> Option<JobStatistics> {
    match try_scan_job(&analyzer, &target, &job).await {
        Ok(statistics) => Some(statistics),
        Err(e) => {
            error!(namespace = %target.namespace, job = %job, %e, "job scan aborted");
            None
        }
    }
}

async fn try_scan_job(
    analyzer: &FleetAnalyzer,
    target: &NamespaceTarget,
    job: &str,
) -> Result<JobStatistics, RegistryError> {
    let registry = target.registry.as_ref();

    let load_level_path = JobPaths::config(job, CONFIG_LOAD_LEVEL);
    let load_level = parse_load_level(&load_level_path, registry.read(&load_level_path).await?.as_deref());
    let servers = registry.children(&JobPaths::servers(job)).await?.unwrap_or_default();

    let mut statistics = JobStatistics::new(job, &target.namespace, &target.name_and_namespace, load_level);
    analyzer
        .analyze_servers(target, job, load_level, &servers, &mut statistics)
        .await?;
    Ok(statistics)
}

impl Collector for NamespaceCollector {
    fn collect(&mut self, _start_time: DateTime<Utc>) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let namespace = self.target.namespace.clone();
            let mut data = NamespaceData::new(&namespace, &self.target.name_and_namespace);

            match self.analyzer.analyze_executors(&self.target).await {
                Ok(report) => data.executor_scan = Some(report),
                Err(e) => {
                    error!(%namespace, %e, "executor scan aborted");
                    data.failed_units += 1;
                }
            }

            if let Err(e) = self.scan_jobs(&mut data).await {
                error!(%namespace, %e, "failed to list jobs");
                data.failed_units += 1;
            }

            info!(
                %namespace,
                jobs = data.jobs.len(),
                failed_units = data.failed_units,
                "namespace collected"
            );
            self.metrics = Some(data);
            Ok(())
        })
    }

    fn format(&self) -> String {
        let Some(metrics) = &self.metrics else {
            return format!("\n📦 Namespace {}: no data collected\n", self.target.namespace);
        };

        let mut output = String::new();
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new(format!("📦 {}", metrics.name_and_namespace))
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan),
                Cell::new(""),
            ]);

        match &metrics.executor_scan {
            Some(scan) => {
                table.add_row(vec![
                    Cell::new("Executors").add_attribute(Attribute::Bold),
                    Cell::new(format!("{} online / {} registered", scan.online_executors, scan.total_executors)),
                ]);
                table.add_row(vec![
                    Cell::new("Version").add_attribute(Attribute::Bold),
                    Cell::new(&scan.version),
                ]);
                table.add_row(vec![
                    Cell::new("No traffic").add_attribute(Attribute::Bold),
                    Cell::new(scan.stale_executors.join(", ")).fg(if scan.stale_executors.is_empty() {
                        Color::Green
                    } else {
                        Color::Red
                    }),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new("Executors").add_attribute(Attribute::Bold),
                    Cell::new("scan aborted").fg(Color::Red),
                ]);
            }
        }

        table.add_row(vec![
            Cell::new("Jobs").add_attribute(Attribute::Bold),
            Cell::new(metrics.jobs.len().to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Processed Today").add_attribute(Attribute::Bold),
            Cell::new(format!(
                "{} ({} failed)",
                metrics.process_count_of_the_day(),
                metrics.failure_count_of_the_day()
            )),
        ]);
        if metrics.failed_units > 0 {
            table.add_row(vec![
                Cell::new("Failed Units").add_attribute(Attribute::Bold),
                Cell::new(metrics.failed_units.to_string()).fg(Color::Red),
            ]);
        }

        output.push_str(&format!("{}\n", table));
        output
    }

    fn summary(&self) -> serde_json::Value {
        serde_json::to_value(&self.metrics).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "NamespaceCollector"
    }
}
