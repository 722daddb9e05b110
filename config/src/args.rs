use clap::Parser;
use std::path::PathBuf;

/// Fleet health collector
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Registry snapshot file (yaml) to scan.
    #[clap(long, value_name = "FILE", env = "FLEET_HEALTH_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Only scan these namespaces. May be repeated.
    #[clap(long = "namespace", value_name = "NAMESPACE")]
    pub namespaces: Vec<String>,

    /// How long an executor may stay traffic-drained before an alarm is raised (e.g. "24h").
    #[clap(long, value_name = "DURATION")]
    pub staleness_threshold: Option<String>,

    /// Time between two collection cycles (e.g. "5m", "30s").
    #[clap(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Run a single collection cycle and exit.
    #[clap(long, action)]
    pub once: bool,

    /// Export the summary of every cycle as JSON to this file.
    #[clap(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Enable debug logging.
    #[clap(short, long, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(snapshot) = &self.snapshot {
                cache.insert(
                    "registry_snapshot".to_string(),
                    snapshot.display().to_string().into(),
                );
            }
            if !self.namespaces.is_empty() {
                cache.insert("namespaces".to_string(), self.namespaces.clone().into());
            }
            if let Some(threshold) = &self.staleness_threshold {
                cache.insert("staleness_threshold".to_string(), threshold.clone().into());
            }
            if let Some(interval) = &self.interval {
                cache.insert("collection_interval".to_string(), interval.clone().into());
            }
            if self.once {
                cache.insert("once".to_string(), true.into());
            }
            if let Some(output_file) = &self.output_file {
                cache.insert("output_file".to_string(), output_file.display().to_string().into());
            }
            if self.verbose {
                cache.insert("verbose".to_string(), true.into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "{version}

Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        version = clap::crate_version!(),
    )
}
