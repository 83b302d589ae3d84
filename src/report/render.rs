//! Plain-text report rendering.

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};

use super::{iso, ReportZone, Severity};
use crate::analysis::Analysis;
use crate::data::{Metric, PartReading, PartStatus, Thresholds};

/// Number of banner variants per severity.
pub const BANNER_COUNT: usize = 3;

const CRITICAL_BANNERS: [&str; BANNER_COUNT] = [
    "!!! CRITICAL ALERT: IMMEDIATE ACTION REQUIRED !!!",
    "*** CRITICAL FAILURE RISK DETECTED ***",
    "### CRITICAL CONDITION: ROBOT SAFETY AT RISK ###",
];

const EMERGENCY_BANNERS: [&str; BANNER_COUNT] = [
    "=== EMERGENCY MAINTENANCE NOTICE ===",
    "=== EMERGENCY: ABNORMAL READINGS DETECTED ===",
    "=== EMERGENCY INSPECTION REQUESTED ===",
];

const CRITICAL_PROCEDURE: [&str; 6] = [
    "Stop the robot immediately with the emergency stop",
    "Isolate power and apply lockout/tagout before approaching",
    "Notify the shift supervisor and the maintenance lead",
    "Inspect every affected part listed above and record findings",
    "Repair or replace damaged components before restart",
    "Run a supervised test cycle and confirm readings are back to normal",
];

const EMERGENCY_PROCEDURE: [&str; 5] = [
    "Reduce the robot's operating speed and payload",
    "Notify the maintenance team of the affected parts",
    "Schedule an inspection within the current shift",
    "Watch the affected parts closely on the monitoring screen",
    "Record the outcome in the maintenance log",
];

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

/// What caused the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Parts in the live snapshot crossed a threshold.
    Live,
    /// The newest readings in history stayed above tier-1 limits.
    SustainedHistory,
}

impl Trigger {
    fn describe(&self) -> &'static str {
        match self {
            Trigger::Live => "live telemetry",
            Trigger::SustainedHistory => "sustained anomaly in recent history (monitor stopped)",
        }
    }
}

/// An affected part paired with its analysis.
#[derive(Debug, Clone)]
pub struct Finding {
    pub part: PartReading,
    pub analysis: Analysis,
}

/// A fully assembled incident report for one robot.
#[derive(Debug, Clone)]
pub struct Report {
    pub robot_id: String,
    pub robot_name: String,
    pub findings: Vec<Finding>,
    /// Aggregated recommendations from the analyzer.
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub trigger: Trigger,
}

impl Report {
    /// Report filename, e.g. `CRITICAL_report_robot-001_2026-10-19T05-05-03-000Z.txt`.
    pub fn filename(&self) -> String {
        let stamp = iso(&self.timestamp).replace([':', '.'], "-");
        format!("{}_report_{}_{}.txt", self.severity.file_prefix(), self.robot_id, stamp)
    }

    /// The line appended to the shared log for this report.
    pub fn log_line(&self, filename: &str) -> String {
        format!(
            "[{}] {}: {} - {} critical parts - Report: {}",
            iso(&self.timestamp),
            self.severity.log_label(),
            self.robot_id,
            self.findings.len(),
            filename
        )
    }

    /// Render the report text.
    ///
    /// `banner` selects one of [`BANNER_COUNT`] headers; out-of-range values wrap.
    pub fn render(&self, banner: usize, zone: &ReportZone, thresholds: &Thresholds) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.compose(&mut out, banner % BANNER_COUNT, zone, thresholds);
        out
    }

    fn compose(
        &self,
        out: &mut String,
        banner: usize,
        zone: &ReportZone,
        thresholds: &Thresholds,
    ) -> fmt::Result {
        let critical = self.severity.is_critical();
        let headline = if critical {
            CRITICAL_BANNERS[banner]
        } else {
            EMERGENCY_BANNERS[banner]
        };

        writeln!(out, "{}", RULE)?;
        writeln!(out, "  {}", headline)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;

        writeln!(out, "[Robot]")?;
        writeln!(out, "  Robot ID       : {}", self.robot_id)?;
        writeln!(out, "  Robot Name     : {}", self.robot_name)?;
        writeln!(out, "  Severity       : {}", self.severity.log_label())?;
        writeln!(out, "  Trigger        : {}", self.trigger.describe())?;
        writeln!(out, "  Affected Parts : {}", self.findings.len())?;
        writeln!(out, "  Detected At    : {}", zone.human(&self.timestamp))?;
        writeln!(out, "  Timestamp      : {}", iso(&self.timestamp))?;
        writeln!(out)?;

        writeln!(out, "[Part Details]")?;
        for finding in &self.findings {
            self.write_part(out, &finding.part, zone)?;
        }

        writeln!(out, "[Detected Events]")?;
        for finding in &self.findings {
            write_events(out, &finding.part, thresholds)?;
        }
        writeln!(out)?;

        writeln!(out, "[Analysis]")?;
        for finding in &self.findings {
            let analysis = &finding.analysis;
            writeln!(out, "  {} ({})", finding.part.name, finding.part.id)?;
            writeln!(out, "    Summary    : {}", analysis.summary)?;
            writeln!(out, "    Confidence : {:.0}%", analysis.confidence * 100.0)?;
            writeln!(out, "    Recommendations:")?;
            for (i, rec) in analysis.recommendations.iter().enumerate() {
                writeln!(out, "      {}. {}", i + 1, rec)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[Recommended Actions]")?;
        for rec in &self.recommendations {
            writeln!(out, "  - {}", rec)?;
        }
        for line in supplemental_lines(&self.findings, thresholds) {
            writeln!(out, "  - {}", line)?;
        }
        writeln!(out)?;

        writeln!(out, "[Response Procedure]")?;
        let steps: &[&str] = if critical {
            &CRITICAL_PROCEDURE
        } else {
            &EMERGENCY_PROCEDURE
        };
        for (i, step) in steps.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, step)?;
        }
        writeln!(out)?;

        writeln!(out, "{}", THIN_RULE)?;
        writeln!(out, "[System Information]")?;
        writeln!(out, "  Generator    : {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "  Report File  : {}", self.filename())?;
        writeln!(out, "  Generated At : {}", zone.human(&self.timestamp))?;
        writeln!(out, "  ISO 8601     : {}", iso(&self.timestamp))?;
        writeln!(out, "{}", RULE)?;
        Ok(())
    }

    fn write_part(&self, out: &mut String, part: &PartReading, zone: &ReportZone) -> fmt::Result {
        let m = &part.metrics;
        writeln!(out, "  {} ({})", part.name, part.id)?;
        writeln!(out, "    Status          : {}", part.status().label())?;
        for (metric, value) in [
            (Metric::Temperature, m.temperature),
            (Metric::Vibration, m.vibration),
            (Metric::Humidity, m.humidity),
            (Metric::OperatingHours, f64::from(m.operating_hours)),
            (Metric::Voltage, m.voltage),
            (Metric::CpuLoad, m.cpu_load),
        ] {
            writeln!(
                out,
                "    {:<15} : {} {}",
                metric.label(),
                metric.format_value(value),
                metric.unit()
            )?;
        }
        writeln!(
            out,
            "    {:<15} : {}",
            Metric::AbnormalNoise.label(),
            if m.abnormal_noise { "DETECTED" } else { "none" }
        )?;
        writeln!(
            out,
            "    Last Update     : {} ({})",
            zone.human(&part.last_update),
            iso(&part.last_update)
        )?;
        writeln!(out)
    }
}

/// Re-apply the thresholds to describe what each part crossed.
fn write_events(out: &mut String, part: &PartReading, thresholds: &Thresholds) -> fmt::Result {
    writeln!(out, "  {} ({}):", part.name, part.id)?;
    let violations = thresholds.violations(&part.metrics);

    for v in &violations {
        let tag = if v.level == PartStatus::Critical {
            "CRITICAL"
        } else {
            "WARNING"
        };
        match v.metric {
            Metric::AbnormalNoise => writeln!(out, "    [{}] Abnormal noise detected", tag)?,
            Metric::Voltage => writeln!(
                out,
                "    [{}] Voltage {}{} below {}{}",
                tag,
                v.metric.format_value(v.value),
                v.metric.unit(),
                v.metric.format_value(v.limit),
                v.metric.unit()
            )?,
            _ => writeln!(
                out,
                "    [{}] {} {}{} above {}{}",
                tag,
                v.metric.label(),
                v.metric.format_value(v.value),
                v.metric.unit(),
                v.metric.format_value(v.limit),
                v.metric.unit()
            )?,
        }
    }

    let spikes = [
        (part.spikes.temperature, "temperature"),
        (part.spikes.vibration, "vibration"),
        (part.spikes.humidity, "humidity"),
    ];
    for (_, name) in spikes.iter().filter(|(set, _)| *set) {
        writeln!(out, "    [CRITICAL] Sudden {} spike", name)?;
    }

    if violations.is_empty() && !part.spikes.any() {
        writeln!(out, "    No threshold exceeded (status {})", part.status().label())?;
    }
    Ok(())
}

/// Fixed lines added when power, controller or acoustic anomalies are present.
fn supplemental_lines(findings: &[Finding], thresholds: &Thresholds) -> Vec<&'static str> {
    let mut lines = Vec::new();
    let parts = || findings.iter().map(|f| &f.part.metrics);

    if parts().any(|m| m.voltage < thresholds.voltage_critical) {
        lines.push("Check the power supply unit and cabling for voltage drop");
    }
    if parts().any(|m| m.cpu_load > thresholds.cpu_critical) {
        lines.push("Check controller processes and restart the control software if needed");
    }
    if parts().any(|m| m.abnormal_noise) {
        lines.push("Perform an acoustic inspection of drive trains and gearboxes");
    }
    lines
}
