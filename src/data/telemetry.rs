//! Part readings, robot snapshots and threshold classification.
//!
//! A [`PartReading`] carries the raw [`Metrics`] for one part plus a status
//! derived from [`Thresholds`]. Tier-1 limits produce `critical`, tier-2
//! limits produce `warning`, anything else is `normal`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status for a robot part.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    #[default]
    Normal,
    Warning,
    Critical,
    /// Reported by external feeds only; the simulator never derives it.
    Emergency,
}

impl PartStatus {
    /// Upper-case label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            PartStatus::Normal => "NORMAL",
            PartStatus::Warning => "WARNING",
            PartStatus::Critical => "CRITICAL",
            PartStatus::Emergency => "EMERGENCY",
        }
    }

    /// Critical and emergency parts both trigger a critical report.
    pub fn is_critical(&self) -> bool {
        matches!(self, PartStatus::Critical | PartStatus::Emergency)
    }
}

/// The measurable quantities of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature,
    Vibration,
    Humidity,
    OperatingHours,
    Voltage,
    CpuLoad,
    AbnormalNoise,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Vibration => "Vibration",
            Metric::Humidity => "Humidity",
            Metric::OperatingHours => "Operating hours",
            Metric::Voltage => "Voltage",
            Metric::CpuLoad => "CPU load",
            Metric::AbnormalNoise => "Abnormal noise",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Vibration => "G",
            Metric::Humidity => "%",
            Metric::OperatingHours => "h",
            Metric::Voltage => "V",
            Metric::CpuLoad => "%",
            Metric::AbnormalNoise => "",
        }
    }

    /// Render a value with the fixed precision used in reports.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Metric::Temperature | Metric::Humidity | Metric::Voltage => format!("{:.1}", value),
            Metric::Vibration => format!("{:.3}", value),
            Metric::OperatingHours | Metric::CpuLoad => format!("{:.0}", value),
            Metric::AbnormalNoise => {
                if value > 0.0 {
                    "detected".to_string()
                } else {
                    "none".to_string()
                }
            }
        }
    }
}

/// Raw measurements for a single part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Peak acceleration in G.
    pub vibration: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Hours since the last maintenance reset.
    pub operating_hours: u32,
    /// Supply voltage (nominal 24 V).
    pub voltage: f64,
    /// Controller CPU load, percent.
    pub cpu_load: f64,
    pub abnormal_noise: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            temperature: 40.0,
            vibration: 0.15,
            humidity: 50.0,
            operating_hours: 10,
            voltage: 24.0,
            cpu_load: 40.0,
            abnormal_noise: false,
        }
    }
}

/// Sudden-jump markers set by the telemetry generator.
///
/// Any spike is a tier-1 condition regardless of the measured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeFlags {
    pub temperature: bool,
    pub vibration: bool,
    pub humidity: bool,
}

impl SpikeFlags {
    pub fn any(&self) -> bool {
        self.temperature || self.vibration || self.humidity
    }
}

/// Thresholds for part status classification.
///
/// `*_warning` limits are tier-2 conditions, `*_critical` limits are tier-1.
/// All comparisons are strict; voltage limits are lower bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temperature_warning: f64,
    pub temperature_critical: f64,
    pub vibration_warning: f64,
    pub vibration_critical: f64,
    pub humidity_warning: f64,
    pub humidity_critical: f64,
    pub hours_warning: u32,
    pub hours_critical: u32,
    pub voltage_warning: f64,
    pub voltage_critical: f64,
    pub cpu_warning: f64,
    pub cpu_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_warning: 50.0,
            temperature_critical: 60.0,
            vibration_warning: 0.3,
            vibration_critical: 0.4,
            humidity_warning: 70.0,
            humidity_critical: 80.0,
            hours_warning: 30,
            hours_critical: 40,
            voltage_warning: 23.0,
            voltage_critical: 22.5,
            cpu_warning: 75.0,
            cpu_critical: 85.0,
        }
    }
}

/// A single metric outside its normal band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub metric: Metric,
    /// `Warning` for tier-2, `Critical` for tier-1.
    pub level: PartStatus,
    pub value: f64,
    pub limit: f64,
}

impl Thresholds {
    /// Every metric of `m` that crosses a tier-1 or tier-2 limit.
    ///
    /// A metric is reported once, at the highest tier it reaches.
    pub fn violations(&self, m: &Metrics) -> Vec<Violation> {
        let mut out = Vec::new();
        let mut check = |metric, value: f64, warn: f64, crit: f64, above: bool| {
            let past = |limit: f64| if above { value > limit } else { value < limit };
            if past(crit) {
                out.push(Violation {
                    metric,
                    level: PartStatus::Critical,
                    value,
                    limit: crit,
                });
            } else if past(warn) {
                out.push(Violation {
                    metric,
                    level: PartStatus::Warning,
                    value,
                    limit: warn,
                });
            }
        };

        check(
            Metric::Temperature,
            m.temperature,
            self.temperature_warning,
            self.temperature_critical,
            true,
        );
        check(
            Metric::Vibration,
            m.vibration,
            self.vibration_warning,
            self.vibration_critical,
            true,
        );
        check(
            Metric::Humidity,
            m.humidity,
            self.humidity_warning,
            self.humidity_critical,
            true,
        );
        check(
            Metric::OperatingHours,
            f64::from(m.operating_hours),
            f64::from(self.hours_warning),
            f64::from(self.hours_critical),
            true,
        );
        check(
            Metric::Voltage,
            m.voltage,
            self.voltage_warning,
            self.voltage_critical,
            false,
        );
        check(
            Metric::CpuLoad,
            m.cpu_load,
            self.cpu_warning,
            self.cpu_critical,
            true,
        );

        if m.abnormal_noise {
            out.push(Violation {
                metric: Metric::AbnormalNoise,
                level: PartStatus::Critical,
                value: 1.0,
                limit: 0.0,
            });
        }

        out
    }

    /// Derive a part status: critical beats warning beats normal.
    pub fn classify(&self, m: &Metrics, spikes: &SpikeFlags) -> PartStatus {
        let violations = self.violations(m);
        if spikes.any() || violations.iter().any(|v| v.level == PartStatus::Critical) {
            PartStatus::Critical
        } else if !violations.is_empty() {
            PartStatus::Warning
        } else {
            PartStatus::Normal
        }
    }
}

/// One reading for one part at one tick.
///
/// The status is derived from the metrics when the reading is measured and
/// cannot be set afterwards, except through escalation by the evaluator.
/// A status arriving with deserialized input is provisional until
/// [`reclassify`](Self::reclassify) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartReading {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub metrics: Metrics,
    #[serde(default)]
    pub spikes: SpikeFlags,
    #[serde(default)]
    status: PartStatus,
    pub last_update: DateTime<Utc>,
}

impl PartReading {
    /// Build a reading and classify it against `thresholds`.
    pub fn measure(
        id: impl Into<String>,
        name: impl Into<String>,
        metrics: Metrics,
        spikes: SpikeFlags,
        thresholds: &Thresholds,
        at: DateTime<Utc>,
    ) -> Self {
        let status = thresholds.classify(&metrics, &spikes);
        Self {
            id: id.into(),
            name: name.into(),
            metrics,
            spikes,
            status,
            last_update: at,
        }
    }

    pub fn status(&self) -> PartStatus {
        self.status
    }

    /// Re-derive the status from the metrics.
    ///
    /// A supplied `Emergency` is kept since no threshold derives it; any
    /// other supplied status is replaced.
    pub fn reclassify(&mut self, thresholds: &Thresholds) {
        if self.status != PartStatus::Emergency {
            self.status = thresholds.classify(&self.metrics, &self.spikes);
        }
    }

    /// Copy of this reading forced to critical status.
    pub(crate) fn escalated(&self) -> Self {
        Self {
            status: PartStatus::Critical,
            ..self.clone()
        }
    }
}

/// A robot as listed in the monitored roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotIdentity {
    pub id: String,
    pub name: String,
}

impl RobotIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// All part readings of one robot captured at a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub robot_id: String,
    pub robot_name: String,
    pub parts: Vec<PartReading>,
    pub last_check: DateTime<Utc>,
}
