//! Report suppression per robot and calendar day.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::report::{iso, ReportZone};

/// Tracks the last emission per dedup key.
///
/// A key is `{robot_id}_{date}` where the date is taken in the report
/// zone. A new report for a key is suppressed while the previous one is
/// younger than the window. Keys change at local midnight, so two reports
/// straddling a date rollover are never suppressed against each other.
#[derive(Debug, Clone)]
pub struct DedupTracker {
    window: Duration,
    zone: ReportZone,
    last: BTreeMap<String, DateTime<Utc>>,
}

impl DedupTracker {
    pub fn new(window: Duration, zone: ReportZone) -> Self {
        Self {
            window,
            zone,
            last: BTreeMap::new(),
        }
    }

    /// Dedup key for a robot at an instant.
    pub fn key(&self, robot_id: &str, at: &DateTime<Utc>) -> String {
        format!("{}_{}", robot_id, self.zone.date_key(at))
    }

    /// Whether a report for `key` at `at` falls inside the window of the
    /// previous one.
    pub fn is_suppressed(&self, key: &str, at: &DateTime<Utc>) -> bool {
        let Some(previous) = self.last.get(key) else {
            return false;
        };
        match (*at - *previous).to_std() {
            Ok(elapsed) => elapsed < self.window,
            // Clock went backwards
            Err(_) => true,
        }
    }

    /// Record an emission, replacing any earlier one for the key.
    pub fn record(&mut self, key: String, at: DateTime<Utc>) {
        self.last.insert(key, at);
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// Key to ISO timestamp of the last emission.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.last.iter().map(|(k, v)| (k.clone(), iso(v))).collect()
    }
}
