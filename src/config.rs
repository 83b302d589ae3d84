//! Settings loading.
//!
//! Settings come from built-in defaults, an optional config file and
//! `PARTWATCH_*` environment variables, in that order of precedence:
//!
//! ```toml
//! reports_dir = "reports"
//! log_file = "system_monitor.log"
//! tick_interval = "5s"
//! dedup_window = "5m"
//! timezone_offset_hours = 9
//! timezone_label = "JST"
//!
//! [[robots]]
//! id = "robot-001"
//! name = "Assembly Robot A"
//!
//! [thresholds]
//! temperature_critical = 60.0
//! ```
//!
//! Nested keys use `__` in environment variables, e.g.
//! `PARTWATCH_THRESHOLDS__CPU_CRITICAL=90`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::FixedOffset;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::data::{RobotIdentity, Thresholds};
use crate::report::ReportZone;

/// Raw settings as read from file and environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reports_dir: PathBuf,
    pub log_file: PathBuf,
    /// Duration string, e.g. "5s".
    pub tick_interval: String,
    /// Duration string, e.g. "5m".
    pub dedup_window: String,
    pub timezone_offset_hours: i32,
    pub timezone_label: String,
    /// Fixed seed for the simulator and banner selection.
    pub seed: Option<u64>,
    pub robots: Vec<RobotIdentity>,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            log_file: PathBuf::from("system_monitor.log"),
            tick_interval: "5s".to_string(),
            dedup_window: "5m".to_string(),
            timezone_offset_hours: 9,
            timezone_label: "JST".to_string(),
            seed: None,
            robots: default_roster(),
            thresholds: Thresholds::default(),
        }
    }
}

fn default_roster() -> Vec<RobotIdentity> {
    vec![
        RobotIdentity::new("robot-001", "Assembly Robot A"),
        RobotIdentity::new("robot-002", "Welding Robot B"),
        RobotIdentity::new("robot-003", "Painting Robot C"),
    ]
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("PARTWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate and convert into the typed monitor configuration.
    pub fn into_monitor_config(self) -> Result<MonitorConfig> {
        let tick_interval = parse_duration(&self.tick_interval)?;
        if tick_interval.is_zero() {
            bail!("tick_interval must be greater than zero");
        }
        let dedup_window = parse_duration(&self.dedup_window)?;

        let offset = self
            .timezone_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}h", self.timezone_offset_hours))?;

        if self.robots.is_empty() {
            bail!("At least one robot must be configured");
        }

        Ok(MonitorConfig {
            robots: self.robots,
            tick_interval,
            dedup_window,
            reports_dir: self.reports_dir,
            log_file: self.log_file,
            zone: ReportZone::new(offset, self.timezone_label),
            thresholds: self.thresholds,
            seed: self.seed,
        })
    }
}

/// Validated configuration for a [`Monitor`](crate::monitor::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Robots evaluated on every tick, in order.
    pub robots: Vec<RobotIdentity>,
    pub tick_interval: Duration,
    /// Suppression window for repeated reports of one robot and day.
    pub dedup_window: Duration,
    pub reports_dir: PathBuf,
    pub log_file: PathBuf,
    pub zone: ReportZone,
    pub thresholds: Thresholds,
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            robots: default_roster(),
            tick_interval: Duration::from_secs(5),
            dedup_window: Duration::from_secs(300),
            reports_dir: PathBuf::from("reports"),
            log_file: PathBuf::from("system_monitor.log"),
            zone: ReportZone::jst(),
            thresholds: Thresholds::default(),
            seed: None,
        }
    }
}
