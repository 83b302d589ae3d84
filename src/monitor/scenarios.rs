//! End-to-end checks driving the monitor through a channel-fed source.

use std::fs;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::watch;

use super::{Emission, Monitor};
use crate::analysis::RuleBasedAnalyzer;
use crate::config::MonitorConfig;
use crate::data::{Metrics, PartReading, RobotSnapshot, SpikeFlags, Thresholds};
use crate::source::{ChannelSource, TelemetryFeed};

struct Harness {
    dir: TempDir,
    tx: watch::Sender<TelemetryFeed>,
    monitor: Monitor,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = MonitorConfig {
            reports_dir: dir.path().join("reports"),
            log_file: dir.path().join("system_monitor.log"),
            seed: Some(7),
            ..MonitorConfig::default()
        };
        let (tx, source) = ChannelSource::create("test");
        let monitor =
            Monitor::new(config, Box::new(source), Box::new(RuleBasedAnalyzer::default()));
        Self { dir, tx, monitor }
    }

    /// Publish a single-part snapshot for robot-001.
    fn publish(&self, part_id: &str, metrics: Metrics, at: DateTime<Utc>) {
        let part = PartReading::measure(
            part_id,
            "Head Unit",
            metrics,
            SpikeFlags::default(),
            &Thresholds::default(),
            at,
        );
        let snapshot = RobotSnapshot {
            robot_id: "robot-001".to_string(),
            robot_name: "Assembly Robot A".to_string(),
            parts: vec![part],
            last_check: at,
        };
        self.tx.send_modify(|feed| {
            feed.insert(snapshot.robot_id.clone(), snapshot);
        });
    }

    fn report_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path().join("reports"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn read_report(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join("reports").join(name)).unwrap()
    }
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, h, m, s).unwrap()
}

fn hot(temperature: f64) -> Metrics {
    Metrics {
        temperature,
        ..Metrics::default()
    }
}

fn section<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text.find(header).unwrap();
    let rest = &text[start + header.len()..];
    let end = rest.find("\n[").unwrap_or(rest.len());
    &rest[..end]
}

#[test]
fn test_critical_temperature_writes_critical_report() {
    let h = Harness::new();
    h.publish("head", hot(65.0), at(3, 0, 0));

    let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
    assert_eq!(outcome.critical_count, 1);

    let files = h.report_files();
    assert_eq!(files, vec!["CRITICAL_report_robot-001_2026-10-19T03-00-00-000Z.txt"]);

    let text = h.read_report(&files[0]);
    let header = text.lines().take(3).collect::<Vec<_>>().join("\n");
    assert!(header.contains("CRITICAL"));
    assert!(text.contains("[CRITICAL] Temperature 65.0°C above 60.0°C"));
    assert!(text.contains("2026/10/19 12:00:00 JST"));
    assert_eq!(section(&text, "[Response Procedure]").matches(". ").count(), 6);
}

#[test]
fn test_warning_temperature_writes_emergency_report() {
    let h = Harness::new();
    h.publish("head", hot(55.0), at(3, 0, 0));

    let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
    assert_eq!(outcome.critical_count, 0);
    assert_eq!(outcome.warning_count, 1);

    let files = h.report_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("emergency_report_robot-001_"));

    let text = h.read_report(&files[0]);
    let procedure = section(&text, "[Response Procedure]");
    assert!(procedure.contains("  5. "));
    assert!(!procedure.contains("  6. "));
}

#[test]
fn test_repeat_inside_window_is_suppressed() {
    let h = Harness::new();
    h.publish("head", hot(65.0), at(3, 0, 0));
    h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
    let before = h.monitor.status().last_report_times;

    let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, 10)).unwrap();
    assert_eq!(
        outcome.emissions,
        vec![Emission::Suppressed {
            key: "robot-001_2026-10-19".to_string()
        }]
    );
    assert_eq!(h.report_files().len(), 1);
    assert_eq!(h.monitor.status().last_report_times, before);
}

#[test]
fn test_repeat_after_window_is_written() {
    let h = Harness::new();
    h.publish("head", hot(65.0), at(3, 0, 0));
    h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();

    let later = at(3, 0, 0) + TimeDelta::minutes(5) + TimeDelta::seconds(1);
    let outcome = h.monitor.check_robot_at("robot-001", later).unwrap();
    assert_eq!(outcome.written().len(), 1);
    assert_eq!(h.report_files().len(), 2);
    assert_eq!(h.monitor.status().reports_emitted, 2);
}

#[test]
fn test_sustained_vibration_reported_while_stopped() {
    let h = Harness::new();
    let shaky = Metrics {
        vibration: 0.5,
        ..Metrics::default()
    };
    for (i, s) in [0, 10, 20].into_iter().enumerate() {
        h.publish("head", shaky, at(3, 0, s));
        let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, s)).unwrap();
        assert_eq!(outcome.critical_count, 1, "check {}", i);
    }
    assert_eq!(h.report_files().len(), 1);

    // Live reading recovers, history still holds three shaky entries
    h.publish("head", Metrics::default(), at(3, 6, 0));
    let outcome = h.monitor.check_robot_at("robot-001", at(3, 6, 0)).unwrap();
    assert_eq!(outcome.critical_count, 0);
    assert_eq!(outcome.written().len(), 1);

    let name = outcome.written()[0].to_string();
    assert!(name.starts_with("CRITICAL_report_"));
    let text = h.read_report(&name);
    assert!(text.contains("sustained anomaly"));
    assert!(text.contains("[CRITICAL] Vibration 0.500G above 0.400G"));
}

#[test]
fn test_log_line_is_appended_per_report() {
    let h = Harness::new();
    h.publish("head", hot(65.0), at(3, 0, 0));
    h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();

    let log = fs::read_to_string(h.dir.path().join("system_monitor.log")).unwrap();
    assert_eq!(
        log,
        "[2026-10-19T03:00:00.000Z] CRITICAL: robot-001 - 1 critical parts - \
         Report: CRITICAL_report_robot-001_2026-10-19T03-00-00-000Z.txt\n"
    );
}

#[test]
fn test_robots_without_data_do_not_stop_the_tick() {
    let h = Harness::new();
    h.publish("head", hot(65.0), at(3, 0, 0));

    let outcomes = h.monitor.tick_at(at(3, 0, 0));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].robot_id, "robot-001");
    assert_eq!(h.monitor.history_len("robot-001", "head"), 1);
}

#[test]
fn test_nominal_readings_write_nothing() {
    let h = Harness::new();
    h.publish("head", Metrics::default(), at(3, 0, 0));

    let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
    assert!(outcome.emissions.is_empty());
    assert!(h.report_files().is_empty());
    assert!(!h.dir.path().join("system_monitor.log").exists());
}

#[test]
fn test_feed_status_is_rederived_from_metrics() {
    let h = Harness::new();
    let snapshot: RobotSnapshot = serde_json::from_value(serde_json::json!({
        "robot_id": "robot-001",
        "robot_name": "Assembly Robot A",
        "last_check": "2026-10-19T03:00:00Z",
        "parts": [{
            "id": "head",
            "name": "Head Unit",
            "temperature": 65.0,
            "vibration": 0.15,
            "humidity": 50.0,
            "operating_hours": 10,
            "voltage": 24.0,
            "cpu_load": 40.0,
            "abnormal_noise": false,
            "status": "normal",
            "last_update": "2026-10-19T03:00:00Z"
        }]
    }))
    .unwrap();
    h.tx.send_modify(|feed| {
        feed.insert(snapshot.robot_id.clone(), snapshot);
    });

    let outcome = h.monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
    assert_eq!(outcome.critical_count, 1);
    let written = outcome.written();
    assert_eq!(written.len(), 1);
    assert!(written[0].starts_with("CRITICAL_report_"));
}

#[test]
fn test_stale_feed_is_recorded_once() {
    let h = Harness::new();
    h.publish("head", Metrics::default(), at(3, 0, 0));

    for s in [0, 5, 10, 15] {
        h.monitor.check_robot_at("robot-001", at(3, 0, s)).unwrap();
    }
    assert_eq!(h.monitor.history_len("robot-001", "head"), 1);

    h.publish("head", Metrics::default(), at(3, 0, 20));
    h.monitor.check_robot_at("robot-001", at(3, 0, 20)).unwrap();
    assert_eq!(h.monitor.history_len("robot-001", "head"), 2);
}
