use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Version recorded when a namespace has no executors or none reports a readable version.
pub const UNKNOWN_VERSION: &str = "-1";

/// Fleet-wide software version distribution.
///
/// Both tallies are cumulative across scans, not a gauge of the current fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCounters {
    /// version -> number of namespace scans attributed to it
    pub domain_number: BTreeMap<String, u64>,
    /// version -> number of executors counted by those scans
    pub executor_number: BTreeMap<String, u64>,
}

impl VersionCounters {
    /// Counts one namespace scan for `version`, weighted by its executor count.
    ///
    /// An empty namespace still counts as a domain but never creates an executor entry.
    pub fn add(&mut self, version: &str, executor_count: u64) {
        *self.domain_number.entry(version.to_string()).or_insert(0) += 1;
        if let Some(count) = self.executor_number.get_mut(version) {
            *count += executor_count;
        } else if executor_count != 0 {
            self.executor_number.insert(version.to_string(), executor_count);
        }
    }

    pub fn total_domains(&self) -> u64 {
        self.domain_number.values().sum()
    }

    pub fn total_executors(&self) -> u64 {
        self.executor_number.values().sum()
    }
}
