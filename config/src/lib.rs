#[macro_use]
extern crate tracing;

mod app_config;
mod args;

pub use app_config::{
    get_config_dir,
    get_data_dir,
    AppConfig,
};
pub use args::Args;
use eyre::{
    eyre,
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_snapshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    pub staleness_threshold: String,
    pub collection_interval: String,
    #[serde(default)]
    pub once: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(default)]
    pub verbose: bool,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl config::Source for Config {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = config::Map::<String, config::Value>::new();
        if let Some(snapshot) = &self.registry_snapshot {
            cache.insert("registry_snapshot".to_string(), snapshot.display().to_string().into());
        }
        cache.insert("namespaces".to_string(), self.namespaces.clone().into());
        cache.insert("staleness_threshold".to_string(), self.staleness_threshold.clone().into());
        cache.insert("collection_interval".to_string(), self.collection_interval.clone().into());
        cache.insert("once".to_string(), self.once.into());
        if let Some(output_file) = &self.output_file {
            cache.insert("output_file".to_string(), output_file.display().to_string().into());
        }
        cache.insert("verbose".to_string(), self.verbose.into());
        Ok(cache)
    }
}

impl Config {
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        Self::from_sources(&get_config_dir(), &get_data_dir(), args)
    }

    /// Layers the compiled-in defaults, an optional `config.yaml` inside
    /// `config_dir` and the command line arguments, in that order.
    pub fn from_sources(config_dir: &Path, data_dir: &Path, args: Args) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.display().to_string())?
            .set_default("config_dir", config_dir.display().to_string())?;

        builder = builder.add_source(Config::default());

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(?cfg, "configuration loaded");

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &Path {
        &self.app_config.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    pub fn staleness_threshold(&self) -> Result<Duration> {
        parse_duration("staleness_threshold", &self.staleness_threshold)
    }

    pub fn collection_interval(&self) -> Result<Duration> {
        parse_duration("collection_interval", &self.collection_interval)
    }

    pub fn registry_snapshot(&self) -> Result<&Path> {
        self.registry_snapshot
            .as_deref()
            .ok_or_else(|| eyre!("no registry snapshot configured; pass --snapshot or set registry_snapshot"))
    }

    pub fn validate(&self) -> Result<()> {
        self.registry_snapshot()?;
        self.staleness_threshold()?;
        if self.collection_interval()?.is_zero() {
            return Err(eyre!("collection_interval must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).wrap_err_with(|| format!("Invalid duration for {key}: '{value}'"))
}
