//! # Alarm Module
//!
//! Describes alarms and the sink they are handed to. Delivering them (mail, chat,
//! paging) is the sink's business; the analyzer only decides that an alarm fires.

use futures::{
    future::BoxFuture,
    FutureExt as _,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;
use strum::{
    Display,
    EnumString,
};

pub const EVENT_NAME: &str = "Saturn Event";

#[derive(Debug, Clone, Copy, Display, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AlarmLevel {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmInfo {
    pub level: AlarmLevel,
    pub name: String,
    pub title: String,
    pub message: String,
}

impl AlarmInfo {
    /// Alarm for an executor that stayed traffic-drained longer than `threshold`.
    pub fn executor_no_traffic(namespace: &str, executor_id: &str, threshold: Duration) -> Self {
        let threshold = format_threshold(threshold);
        Self {
            level: AlarmLevel::Warning,
            name: EVENT_NAME.to_string(),
            title: format!("Executor no traffic more than {threshold}"),
            message: format!(
                "Executor no traffic more than {threshold}: namespace:[{namespace}] executor:[{executor_id}]"
            ),
        }
    }
}

fn format_threshold(threshold: Duration) -> String {
    let secs = threshold.as_secs();
    if secs > 0 && secs % 3600 == 0 && threshold.subsec_nanos() == 0 {
        format!("{} hour", secs / 3600)
    } else {
        humantime::format_duration(threshold).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub namespace: String,
    pub job_name: Option<String>,
    pub executor_id: String,
    pub job_key: Option<String>,
    pub info: AlarmInfo,
}

impl AlarmEvent {
    pub fn for_executor(namespace: impl Into<String>, executor_id: impl Into<String>, info: AlarmInfo) -> Self {
        Self {
            namespace: namespace.into(),
            job_name: None,
            executor_id: executor_id.into(),
            job_key: None,
            info,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    #[error("Alarm was rejected by the sink: {0}")]
    Rejected(String),
    #[error("Alarm sink is unavailable: {0}")]
    Unavailable(String),
}

/// Receives alarms raised by the analyzer.
pub trait AlarmSink: Send + Sync {
    fn raise(&self, event: AlarmEvent) -> BoxFuture<'_, Result<(), AlarmError>>;
}

/// Reports every alarm as a warning in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAlarmSink;

impl AlarmSink for LoggingAlarmSink {
    fn raise(&self, event: AlarmEvent) -> BoxFuture<'_, Result<(), AlarmError>> {
        async move {
            tracing::warn!(
                level = %event.info.level,
                namespace = %event.namespace,
                executor = %event.executor_id,
                job = ?event.job_name,
                title = %event.info.title,
                "{}",
                event.info.message
            );
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn no_traffic_alarm_text() {
        let info = AlarmInfo::executor_no_traffic("ns1", "e1", Duration::from_secs(24 * 60 * 60));
        assert_eq!(info.level, AlarmLevel::Warning);
        assert_eq!(info.name, "Saturn Event");
        assert_eq!(info.title, "Executor no traffic more than 24 hour");
        assert_eq!(
            info.message,
            "Executor no traffic more than 24 hour: namespace:[ns1] executor:[e1]"
        );
    }

    #[test]
    fn odd_thresholds_use_humantime() {
        let info = AlarmInfo::executor_no_traffic("ns1", "e1", Duration::from_secs(90 * 60));
        assert_eq!(info.title, "Executor no traffic more than 1h 30m");
    }

    #[test]
    fn level_names() {
        assert_eq!(AlarmLevel::Warning.to_string(), "WARNING");
        assert_eq!(AlarmLevel::from_str("CRITICAL").unwrap(), AlarmLevel::Critical);
    }

    #[tokio::test]
    async fn logging_sink_accepts_everything() {
        let info = AlarmInfo::executor_no_traffic("ns1", "e1", Duration::from_secs(60));
        LoggingAlarmSink
            .raise(AlarmEvent::for_executor("ns1", "e1", info))
            .await
            .unwrap();
    }
}
