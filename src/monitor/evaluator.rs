//! Snapshot classification.
//!
//! Splits a snapshot into critical and warning parts and, when the
//! scheduler is stopped, looks for parts whose recent history stayed
//! above tier-1 limits.

use crate::data::{
    History, HistoryEntry, Metrics, PartReading, PartStatus, RobotSnapshot, SpikeFlags, Thresholds,
};
use crate::report::Severity;

/// Consecutive history entries that must all be anomalous.
pub const SUSTAINED_WINDOW: usize = 3;

/// Classified parts of one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Parts with critical or emergency status.
    pub critical: Vec<PartReading>,
    /// Parts above the temperature warning limit or with warning status.
    pub warning: Vec<PartReading>,
    /// Synthesized critical entries for sustained anomalies.
    pub sustained: Vec<PartReading>,
}

impl Evaluation {
    /// The live report to raise, if any: critical parts first, then warnings.
    pub fn primary(&self) -> Option<(Severity, &[PartReading])> {
        if !self.critical.is_empty() {
            Some((Severity::Critical, self.critical.as_slice()))
        } else if !self.warning.is_empty() {
            Some((Severity::Emergency, self.warning.as_slice()))
        } else {
            None
        }
    }
}

/// Classify a snapshot.
///
/// `history` must not yet contain `snapshot`. The sustained-anomaly check
/// only runs when `running` is false and no live part is critical.
pub fn evaluate(
    snapshot: &RobotSnapshot,
    history: &History,
    thresholds: &Thresholds,
    running: bool,
) -> Evaluation {
    let critical: Vec<PartReading> =
        snapshot.parts.iter().filter(|p| p.status().is_critical()).cloned().collect();

    let warning: Vec<PartReading> = snapshot
        .parts
        .iter()
        .filter(|p| {
            p.metrics.temperature > thresholds.temperature_warning
                || p.status() == PartStatus::Warning
        })
        .cloned()
        .collect();

    let sustained = if !running && critical.is_empty() {
        sustained_anomalies(snapshot, history, thresholds)
    } else {
        Vec::new()
    };

    Evaluation {
        critical,
        warning,
        sustained,
    }
}

/// Whether a history entry crosses any tier-1 limit it records.
pub fn is_anomalous(entry: &HistoryEntry, thresholds: &Thresholds) -> bool {
    entry.temperature > thresholds.temperature_critical
        || entry.vibration > thresholds.vibration_critical
        || entry.humidity > thresholds.humidity_critical
        || entry.operating_hours > thresholds.hours_critical
}

fn sustained_anomalies(
    snapshot: &RobotSnapshot,
    history: &History,
    thresholds: &Thresholds,
) -> Vec<PartReading> {
    history
        .part_ids(&snapshot.robot_id)
        .into_iter()
        .filter_map(|part_id| {
            let window = history.last_n(&snapshot.robot_id, part_id, SUSTAINED_WINDOW)?;
            if !window.iter().all(|e| is_anomalous(e, thresholds)) {
                return None;
            }
            let newest = window.last()?;
            Some(synthesize(snapshot, part_id, newest, thresholds))
        })
        .collect()
}

/// A critical reading built from the newest anomalous history entry.
///
/// Metrics not kept in history come from the live reading when present.
fn synthesize(
    snapshot: &RobotSnapshot,
    part_id: &str,
    newest: &HistoryEntry,
    thresholds: &Thresholds,
) -> PartReading {
    let live = snapshot.parts.iter().find(|p| p.id == part_id);
    let base = live.map_or_else(Metrics::default, |p| p.metrics);
    let metrics = Metrics {
        temperature: newest.temperature,
        vibration: newest.vibration,
        humidity: newest.humidity,
        operating_hours: newest.operating_hours,
        ..base
    };
    let name = live.map_or(part_id, |p| p.name.as_str());

    PartReading::measure(
        part_id,
        name,
        metrics,
        SpikeFlags::default(),
        thresholds,
        newest.timestamp,
    )
    .escalated()
}
