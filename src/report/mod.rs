//! Incident report rendering and persistence.
//!
//! - [`Report`]: plain-text incident report for one robot
//! - [`ReportSink`]: report directory and the shared append-only log
//! - [`ReportZone`]: the fixed timezone used for human-readable timestamps
//!   and calendar-date keys

mod render;
mod sink;

pub use render::{Finding, Report, Trigger, BANNER_COUNT};
pub use sink::ReportSink;

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Report severity, which selects headers, procedures and file prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    /// Non-critical reports raised for warning-level parts.
    Emergency,
}

impl Severity {
    /// Prefix of the report filename.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Emergency => "emergency",
        }
    }

    /// Label used in the shared log file.
    pub fn log_label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Emergency => "EMERGENCY",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

/// The canonical timezone for report timestamps and dedup dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportZone {
    pub offset: FixedOffset,
    pub label: String,
}

impl ReportZone {
    pub fn new(offset: FixedOffset, label: impl Into<String>) -> Self {
        Self {
            offset,
            label: label.into(),
        }
    }

    /// Japan Standard Time (UTC+9, no daylight saving).
    pub fn jst() -> Self {
        let offset = FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
        Self::new(offset, "JST")
    }

    /// Human-readable local time, e.g. `2026/10/19 14:05:03 JST`.
    pub fn human(&self, at: &DateTime<Utc>) -> String {
        format!("{} {}", at.with_timezone(&self.offset).format("%Y/%m/%d %H:%M:%S"), self.label)
    }

    /// Calendar date in this zone, e.g. `2026-10-19`.
    pub fn date_key(&self, at: &DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%Y-%m-%d").to_string()
    }
}

impl Default for ReportZone {
    fn default() -> Self {
        Self::jst()
    }
}

/// Machine timestamp, e.g. `2026-10-19T05:05:03.000Z`.
pub fn iso(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_and_iso_describe_same_instant() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 5, 5, 3).unwrap();
        let zone = ReportZone::jst();
        assert_eq!(zone.human(&at), "2026/10/19 14:05:03 JST");
        assert_eq!(iso(&at), "2026-10-19T05:05:03.000Z");
    }

    #[test]
    fn test_date_key_follows_zone_not_utc() {
        // 16:30 UTC is already the next day in Japan
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 16, 30, 0).unwrap();
        assert_eq!(ReportZone::jst().date_key(&at), "2026-10-20");

        let utc = ReportZone::new(FixedOffset::east_opt(0).unwrap(), "UTC");
        assert_eq!(utc.date_key(&at), "2026-10-19");
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Critical.file_prefix(), "CRITICAL");
        assert_eq!(Severity::Emergency.file_prefix(), "emergency");
        assert_eq!(Severity::Emergency.log_label(), "EMERGENCY");
    }
}
