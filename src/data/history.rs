//! Per-part reading history for trend detection.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::telemetry::{PartReading, RobotSnapshot};

/// Maximum number of entries kept per robot part.
pub const MAX_HISTORY_SIZE: usize = 10;

/// The subset of a reading that is retained for trends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub temperature: f64,
    pub vibration: f64,
    pub humidity: f64,
    pub operating_hours: u32,
    pub timestamp: DateTime<Utc>,
}

impl From<&PartReading> for HistoryEntry {
    fn from(reading: &PartReading) -> Self {
        Self {
            temperature: reading.metrics.temperature,
            vibration: reading.metrics.vibration,
            humidity: reading.metrics.humidity,
            operating_hours: reading.metrics.operating_hours,
            timestamp: reading.last_update,
        }
    }
}

/// Bounded history keyed by `(robot_id, part_id)`.
///
/// Append-only; once a key holds [`MAX_HISTORY_SIZE`] entries the oldest
/// one is evicted on every push.
#[derive(Debug, Clone, Default)]
pub struct History {
    parts: HashMap<(String, String), VecDeque<HistoryEntry>>,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single reading for a robot.
    pub fn push(&mut self, robot_id: &str, reading: &PartReading) {
        let entries = self
            .parts
            .entry((robot_id.to_string(), reading.id.clone()))
            .or_insert_with(|| VecDeque::with_capacity(MAX_HISTORY_SIZE));
        entries.push_back(HistoryEntry::from(reading));
        if entries.len() > MAX_HISTORY_SIZE {
            entries.pop_front();
        }
    }

    /// Record every part of a snapshot and return how many were stored.
    ///
    /// A reading whose `last_update` matches the newest entry for its part
    /// is a repeat of a stale feed and is skipped.
    pub fn record(&mut self, snapshot: &RobotSnapshot) -> usize {
        let mut stored = 0;
        for part in &snapshot.parts {
            let newest = self
                .entries(&snapshot.robot_id, &part.id)
                .and_then(|entries| entries.back())
                .map(|entry| entry.timestamp);
            if newest == Some(part.last_update) {
                continue;
            }
            self.push(&snapshot.robot_id, part);
            stored += 1;
        }
        stored
    }

    /// Entries for one part, oldest first.
    pub fn entries(&self, robot_id: &str, part_id: &str) -> Option<&VecDeque<HistoryEntry>> {
        self.parts.get(&(robot_id.to_string(), part_id.to_string()))
    }

    /// The newest `n` entries, oldest first.
    ///
    /// Returns `None` if fewer than `n` entries exist.
    pub fn last_n(&self, robot_id: &str, part_id: &str, n: usize) -> Option<Vec<&HistoryEntry>> {
        let entries = self.entries(robot_id, part_id)?;
        if entries.len() < n {
            return None;
        }
        Some(entries.iter().skip(entries.len() - n).collect())
    }

    /// Number of entries held for one part.
    pub fn len(&self, robot_id: &str, part_id: &str) -> usize {
        self.entries(robot_id, part_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Part ids with any history for a robot, sorted.
    pub fn part_ids(&self, robot_id: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .parts
            .keys()
            .filter(|(robot, _)| robot == robot_id)
            .map(|(_, part)| part.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
