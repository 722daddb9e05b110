use chrono::Utc;
use color_eyre::Result;
use eyre::Context as _;
use fleet_health_config::Config;
use fleet_health_stats_gatherer::{
    AlarmSink,
    Collector,
    LoggingAlarmSink,
    NamespaceTarget,
    Orchestrator,
    RegistrySnapshot,
};
use std::{
    sync::Arc,
    time::Duration,
};

/// Runs collection cycles against the configured registry snapshot until interrupted.
pub struct App {
    config: Config,
    staleness_threshold: Duration,
    interval: Duration,
    alarm_sink: Arc<dyn AlarmSink>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            staleness_threshold: config.staleness_threshold()?,
            interval: config.collection_interval()?,
            config,
            alarm_sink: Arc::new(LoggingAlarmSink),
        })
    }

    pub fn with_alarm_sink(mut self, alarm_sink: Arc<dyn AlarmSink>) -> Self {
        self.alarm_sink = alarm_sink;
        self
    }

    pub async fn run(self) -> Result<()> {
        info!(
            snapshot = %self.config.registry_snapshot()?.display(),
            staleness_threshold = %humanize(self.staleness_threshold),
            interval = %humanize(self.interval),
            "starting fleet health collector"
        );

        loop {
            match self.run_cycle().await {
                Ok(orchestrator) => println!("{}", orchestrator.format()),
                Err(e) if self.config.once => return Err(e),
                Err(e) => error!("collection cycle failed: {e:?}"),
            }

            if self.config.once {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                signal = tokio::signal::ctrl_c() => {
                    signal.wrap_err("failed to listen for ctrl-c")?;
                    info!("interrupted, shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// One full cycle: reload the snapshot, scan every namespace, export the summary.
    pub async fn run_cycle(&self) -> Result<Orchestrator> {
        let targets = self.load_targets()?;
        let mut orchestrator = Orchestrator::new(targets, self.alarm_sink.clone())
            .with_staleness_threshold(self.staleness_threshold);

        orchestrator.collect(Utc::now()).await?;

        if let Some(output_file) = &self.config.output_file {
            let json = serde_json::to_string_pretty(&orchestrator.summary())?;
            tokio::fs::write(output_file, json)
                .await
                .wrap_err_with(|| format!("failed to write summary to {}", output_file.display()))?;
            info!(output_file = %output_file.display(), "summary exported");
        }

        Ok(orchestrator)
    }

    fn load_targets(&self) -> Result<Vec<NamespaceTarget>> {
        let path = self.config.registry_snapshot()?;
        let targets = RegistrySnapshot::load(path)
            .and_then(RegistrySnapshot::into_targets)
            .wrap_err_with(|| format!("failed to load registry snapshot {}", path.display()))?;

        if self.config.namespaces.is_empty() {
            return Ok(targets);
        }

        for namespace in &self.config.namespaces {
            if !targets.iter().any(|target| &target.namespace == namespace) {
                warn!(%namespace, "namespace not found in snapshot");
            }
        }
        Ok(targets
            .into_iter()
            .filter(|target| self.config.namespaces.contains(&target.namespace))
            .collect())
    }
}

fn humanize(duration: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(duration)
}
