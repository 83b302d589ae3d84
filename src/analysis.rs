//! Part analysis capability.
//!
//! Reports embed a per-part analysis (summary, confidence and
//! recommendations) and an aggregated recommendation list. Both come from
//! an [`Analyzer`], which the monitor treats as a pure function.
//! [`RuleBasedAnalyzer`] is the built-in implementation.

use std::fmt::Debug;

use crate::data::{HistoryEntry, Metric, PartReading, PartStatus, Thresholds};

/// Result of analysing one part.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

/// Produces analysis text for affected parts.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyse one part given its recent history (oldest first).
    fn analyze(&self, part: &PartReading, history: &[HistoryEntry]) -> Analysis;

    /// Recommendations covering all affected parts.
    fn aggregate_recommendations(&self, parts: &[PartReading]) -> Vec<String>;
}

/// Deterministic analyzer keyed on threshold violations.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAnalyzer {
    thresholds: Thresholds,
}

impl RuleBasedAnalyzer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    fn advice(metric: Metric) -> &'static str {
        match metric {
            Metric::Temperature => {
                "Check cooling fans and reduce duty cycle until temperature settles"
            }
            Metric::Vibration => "Inspect bearings and mounting bolts for wear or looseness",
            Metric::Humidity => "Verify enclosure seals and run the dehumidifier",
            Metric::OperatingHours => "Schedule preventive maintenance and reset the hour counter",
            Metric::Voltage => "Measure supply voltage at the terminal block and check the PSU",
            Metric::CpuLoad => "Review controller task load and restart stalled processes",
            Metric::AbnormalNoise => "Stop the axis and perform an acoustic inspection",
        }
    }

    /// Direction of temperature over the supplied history.
    fn trend(history: &[HistoryEntry]) -> Option<&'static str> {
        let first = history.first()?;
        let last = history.last()?;
        if history.len() < 2 {
            return None;
        }
        let delta = last.temperature - first.temperature;
        Some(if delta > 2.0 {
            "rising"
        } else if delta < -2.0 {
            "falling"
        } else {
            "stable"
        })
    }
}

impl Analyzer for RuleBasedAnalyzer {
    fn analyze(&self, part: &PartReading, history: &[HistoryEntry]) -> Analysis {
        let mut violations = self.thresholds.violations(&part.metrics);
        violations.sort_by(|a, b| b.level.cmp(&a.level));

        let summary = match violations.first() {
            Some(worst) => {
                let severity = if worst.level == PartStatus::Critical {
                    "critical"
                } else {
                    "elevated"
                };
                let mut text = format!(
                    "{} shows {} {} ({}{})",
                    part.name,
                    severity,
                    worst.metric.label().to_lowercase(),
                    worst.metric.format_value(worst.value),
                    worst.metric.unit()
                );
                if violations.len() > 1 {
                    text.push_str(&format!(" with {} further anomalies", violations.len() - 1));
                }
                text
            }
            None if part.spikes.any() => format!("{} recorded a transient spike", part.name),
            None => format!("{} is operating within limits", part.name),
        };
        let summary = match Self::trend(history) {
            Some(trend) => format!("{}; temperature trend {}", summary, trend),
            None => summary,
        };

        let confidence = (0.60 + 0.04 * history.len() as f64).min(0.95);

        let mut recommendations: Vec<String> =
            violations.iter().map(|v| Self::advice(v.metric).to_string()).collect();
        if recommendations.is_empty() {
            recommendations.push("Continue monitoring at the normal interval".to_string());
        }

        Analysis {
            summary,
            confidence,
            recommendations,
        }
    }

    fn aggregate_recommendations(&self, parts: &[PartReading]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for part in parts {
            for v in self.thresholds.violations(&part.metrics) {
                let line = Self::advice(v.metric).to_string();
                if !out.contains(&line) {
                    out.push(line);
                }
            }
        }
        if parts.iter().any(|p| p.status().is_critical()) {
            out.insert(0, "Take affected parts out of production until inspected".to_string());
        }
        if out.is_empty() {
            out.push("Continue monitoring at the normal interval".to_string());
        }
        out
    }
}
