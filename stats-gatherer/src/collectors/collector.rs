use chrono::{
    DateTime,
    Utc,
};
use eyre::Result;
use std::{
    future::Future,
    pin::Pin,
};

/// Trait for collecting and formatting data
pub trait Collector {
    /// Collect data for the cycle that started at `start_time`
    fn collect(&mut self, start_time: DateTime<Utc>) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Format data for display
    fn format(&self) -> String;

    /// Get data summary as JSON
    fn summary(&self) -> serde_json::Value;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
