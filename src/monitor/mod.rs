//! The monitoring service.
//!
//! A [`Monitor`] owns the telemetry source, the per-part history and the
//! dedup state. While started it evaluates every configured robot on a
//! fixed interval; it can also evaluate a single robot on demand.
//!
//! ```text
//! tick ──▶ TelemetrySource::fetch ──▶ evaluate ──▶ History::record
//!                                        │
//!                                        ▼
//!                      DedupTracker ──▶ Report::render ──▶ ReportSink
//! ```
//!
//! All mutable state sits behind one mutex. A tick holds it for the whole
//! roster pass, so [`Monitor::stop`] waits for an in-flight tick instead of
//! interrupting a report write.

pub mod dedup;
pub mod evaluator;

#[cfg(test)]
mod scenarios;

pub use dedup::DedupTracker;
pub use evaluator::{evaluate, Evaluation, SUSTAINED_WINDOW};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::analysis::Analyzer;
use crate::config::MonitorConfig;
use crate::data::duration::format_duration;
use crate::data::{History, HistoryEntry, PartReading, RobotIdentity, RobotSnapshot};
use crate::error::MonitorError;
use crate::report::{Finding, Report, ReportSink, Severity, Trigger, BANNER_COUNT};
use crate::source::TelemetrySource;

/// What happened to one report candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Report file written and logged.
    Written { filename: String },
    /// A report for the same key was emitted inside the dedup window.
    Suppressed { key: String },
    /// No writable report directory; nothing was written.
    Disabled,
    /// Writing the report failed; dedup state was left untouched.
    Failed { error: String },
}

/// Result of evaluating one robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub robot_id: String,
    pub critical_count: usize,
    pub warning_count: usize,
    pub emissions: Vec<Emission>,
}

impl CheckOutcome {
    /// Filenames of reports written during this check.
    pub fn written(&self) -> Vec<&str> {
        self.emissions
            .iter()
            .filter_map(|e| match e {
                Emission::Written { filename } => Some(filename.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Point-in-time view of the monitor for health checks.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub is_running: bool,
    /// e.g. "every 5s"
    pub tick_interval: String,
    pub reports_emitted: u64,
    /// Dedup key to ISO timestamp of the last report.
    pub last_report_times: BTreeMap<String, String>,
    pub reports_dir: String,
    pub source: String,
    /// True when reports cannot be written.
    pub degraded: bool,
}

struct MonitorState {
    running: bool,
    source: Box<dyn TelemetrySource>,
    history: History,
    dedup: DedupTracker,
    reports_emitted: u64,
    rng: StdRng,
    stop_tx: Option<watch::Sender<bool>>,
}

struct Shared {
    config: MonitorConfig,
    analyzer: Box<dyn Analyzer>,
    sink: Option<ReportSink>,
    state: Mutex<MonitorState>,
}

/// Handle to the monitoring service.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct Monitor {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("robots", &self.shared.config.robots.len())
            .field("degraded", &self.shared.sink.is_none())
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Create a stopped monitor.
    ///
    /// The reports directory is created here. If that fails the monitor
    /// runs in degraded mode: evaluations still happen but nothing is
    /// written.
    pub fn new(
        config: MonitorConfig,
        source: Box<dyn TelemetrySource>,
        analyzer: Box<dyn Analyzer>,
    ) -> Self {
        let sink = match ReportSink::open(&config.reports_dir, &config.log_file) {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Report directory unavailable -- report emission disabled"
                );
                None
            }
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let state = MonitorState {
            running: false,
            source,
            history: History::new(),
            dedup: DedupTracker::new(config.dedup_window, config.zone.clone()),
            reports_emitted: 0,
            rng,
            stop_tx: None,
        };

        Self {
            shared: Arc::new(Shared {
                config,
                analyzer,
                sink,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Purge the reports directory and start ticking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut state = self.shared.state.lock();
        if state.running {
            return Err(MonitorError::AlreadyRunning);
        }
        if self.shared.config.tick_interval.is_zero() {
            return Err(MonitorError::InvalidInterval);
        }

        if let Some(sink) = &self.shared.sink {
            match sink.purge() {
                Ok(removed) => tracing::info!(
                    removed,
                    dir = %sink.reports_dir().display(),
                    "Purged report directory"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to purge report directory"),
            }
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        state.running = true;
        state.stop_tx = Some(stop_tx);
        drop(state);

        let monitor = self.clone();
        let interval = self.shared.config.tick_interval;
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; evaluation starts one interval in
            timer.tick().await;

            loop {
                tokio::select! {
                    biased;

                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        monitor.scheduled_tick(Utc::now());
                    }
                }
            }
            tracing::debug!("Scheduler task exited");
        });

        tracing::info!(
            robots = self.shared.config.robots.len(),
            interval = %format_duration(interval),
            "Monitor started"
        );
        Ok(())
    }

    /// Stop ticking. Returns false if the monitor was not running.
    ///
    /// Blocks until an in-flight tick has finished.
    pub fn stop(&self) -> bool {
        let mut state = self.shared.state.lock();
        if !state.running {
            return false;
        }
        state.running = false;
        if let Some(tx) = state.stop_tx.take() {
            let _ = tx.send(true);
        }
        tracing::info!("Monitor stopped");
        true
    }

    /// Evaluate every robot in the roster now.
    pub fn tick(&self) -> Vec<CheckOutcome> {
        self.tick_at(Utc::now())
    }

    /// Evaluate every robot in the roster as of `now`.
    ///
    /// A failure for one robot is logged and does not affect the others.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Vec<CheckOutcome> {
        let mut state = self.shared.state.lock();
        self.evaluate_roster(&mut state, now)
    }

    /// A timer-driven tick. Does nothing once the monitor has been stopped,
    /// so a tick racing `stop` never runs as a stopped evaluation.
    fn scheduled_tick(&self, now: DateTime<Utc>) -> Vec<CheckOutcome> {
        let mut state = self.shared.state.lock();
        if !state.running {
            return Vec::new();
        }
        self.evaluate_roster(&mut state, now)
    }

    fn evaluate_roster(&self, state: &mut MonitorState, now: DateTime<Utc>) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::with_capacity(self.shared.config.robots.len());

        for robot in &self.shared.config.robots {
            match self.evaluate_robot(state, robot, now) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!(robot_id = %robot.id, error = %e, "Robot evaluation failed");
                }
            }
        }
        outcomes
    }

    /// Evaluate one robot on demand.
    pub fn check_robot(&self, robot_id: &str) -> Result<CheckOutcome, MonitorError> {
        self.check_robot_at(robot_id, Utc::now())
    }

    /// Evaluate one robot on demand as of `now`.
    pub fn check_robot_at(
        &self,
        robot_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, MonitorError> {
        let robot = self
            .shared
            .config
            .robots
            .iter()
            .find(|r| r.id == robot_id)
            .ok_or_else(|| MonitorError::UnknownRobot(robot_id.to_string()))?;

        let mut state = self.shared.state.lock();
        self.evaluate_robot(&mut state, robot, now)
    }

    /// Current status for external inspection.
    pub fn status(&self) -> MonitorStatus {
        let state = self.shared.state.lock();
        MonitorStatus {
            is_running: state.running,
            tick_interval: format!("every {}", format_duration(self.shared.config.tick_interval)),
            reports_emitted: state.reports_emitted,
            last_report_times: state.dedup.snapshot(),
            reports_dir: self.shared.config.reports_dir.display().to_string(),
            source: state.source.description().to_string(),
            degraded: self.shared.sink.is_none(),
        }
    }

    /// Number of history entries held for one robot part.
    pub fn history_len(&self, robot_id: &str, part_id: &str) -> usize {
        self.shared.state.lock().history.len(robot_id, part_id)
    }

    fn evaluate_robot(
        &self,
        state: &mut MonitorState,
        robot: &RobotIdentity,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, MonitorError> {
        let mut snapshot = state.source.fetch(robot, now)?;
        for part in &mut snapshot.parts {
            part.reclassify(&self.shared.config.thresholds);
        }
        let evaluation =
            evaluate(&snapshot, &state.history, &self.shared.config.thresholds, state.running);
        state.history.record(&snapshot);

        tracing::debug!(
            robot_id = %robot.id,
            critical = evaluation.critical.len(),
            warning = evaluation.warning.len(),
            sustained = evaluation.sustained.len(),
            "Robot evaluated"
        );

        let mut emissions = Vec::new();
        if let Some((severity, parts)) = evaluation.primary() {
            emissions.push(self.emit(state, &snapshot, severity, Trigger::Live, parts, now));
        }
        if !evaluation.sustained.is_empty() {
            tracing::info!(
                robot_id = %robot.id,
                parts = evaluation.sustained.len(),
                "Sustained anomaly found while monitor is stopped"
            );
            emissions.push(self.emit(
                state,
                &snapshot,
                Severity::Critical,
                Trigger::SustainedHistory,
                &evaluation.sustained,
                now,
            ));
        }

        Ok(CheckOutcome {
            robot_id: robot.id.clone(),
            critical_count: evaluation.critical.len(),
            warning_count: evaluation.warning.len(),
            emissions,
        })
    }

    fn emit(
        &self,
        state: &mut MonitorState,
        snapshot: &RobotSnapshot,
        severity: Severity,
        trigger: Trigger,
        parts: &[PartReading],
        now: DateTime<Utc>,
    ) -> Emission {
        let Some(sink) = &self.shared.sink else {
            tracing::warn!(
                robot_id = %snapshot.robot_id,
                parts = parts.len(),
                severity = severity.log_label(),
                "Report not written -- emission disabled"
            );
            return Emission::Disabled;
        };

        let key = state.dedup.key(&snapshot.robot_id, &now);
        if state.dedup.is_suppressed(&key, &now) {
            tracing::debug!(robot_id = %snapshot.robot_id, key = %key, "Report suppressed");
            return Emission::Suppressed { key };
        }

        let analyzer = &self.shared.analyzer;
        let findings = parts
            .iter()
            .map(|part| {
                let history: Vec<HistoryEntry> = state
                    .history
                    .entries(&snapshot.robot_id, &part.id)
                    .map(|entries| entries.iter().cloned().collect())
                    .unwrap_or_default();
                Finding {
                    part: part.clone(),
                    analysis: analyzer.analyze(part, &history),
                }
            })
            .collect();

        let report = Report {
            robot_id: snapshot.robot_id.clone(),
            robot_name: snapshot.robot_name.clone(),
            findings,
            recommendations: analyzer.aggregate_recommendations(parts),
            timestamp: now,
            severity,
            trigger,
        };

        let banner = state.rng.random_range(0..BANNER_COUNT);
        let text = report.render(banner, &self.shared.config.zone, &self.shared.config.thresholds);
        let filename = report.filename();

        if let Err(e) = sink.write_report(&filename, &text) {
            tracing::error!(robot_id = %snapshot.robot_id, error = %e, "Failed to write report");
            return Emission::Failed {
                error: e.to_string(),
            };
        }
        if let Err(e) = sink.append_log(&report.log_line(&filename)) {
            tracing::warn!(error = %e, "Failed to append to monitor log");
        }

        state.dedup.record(key, now);
        state.reports_emitted += 1;
        tracing::info!(
            robot_id = %snapshot.robot_id,
            severity = severity.log_label(),
            parts = parts.len(),
            report = %filename,
            "Report written"
        );

        Emission::Written { filename }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RuleBasedAnalyzer;
    use crate::data::{Metrics, SpikeFlags, Thresholds};
    use crate::error::SourceError;
    use crate::source::SimulatedSource;
    use chrono::TimeZone;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Returns a fixed part set for every robot except those listed as failing.
    #[derive(Debug)]
    struct FixedSource {
        metrics: Metrics,
        failing: Vec<String>,
    }

    impl TelemetrySource for FixedSource {
        fn fetch(
            &mut self,
            robot: &RobotIdentity,
            now: DateTime<Utc>,
        ) -> Result<RobotSnapshot, SourceError> {
            if self.failing.contains(&robot.id) {
                return Err(SourceError::Unavailable("sensor bus down".to_string()));
            }
            Ok(RobotSnapshot {
                robot_id: robot.id.clone(),
                robot_name: robot.name.clone(),
                parts: vec![PartReading::measure(
                    "head",
                    "Head Unit",
                    self.metrics,
                    SpikeFlags::default(),
                    &Thresholds::default(),
                    now,
                )],
                last_check: now,
            })
        }

        fn description(&self) -> &str {
            "fixed"
        }
    }

    fn config(dir: &TempDir) -> MonitorConfig {
        MonitorConfig {
            reports_dir: dir.path().join("reports"),
            log_file: dir.path().join("system_monitor.log"),
            seed: Some(1),
            ..MonitorConfig::default()
        }
    }

    fn monitor(dir: &TempDir, metrics: Metrics, failing: &[&str]) -> Monitor {
        let source = FixedSource {
            metrics,
            failing: failing.iter().map(|s| s.to_string()).collect(),
        };
        Monitor::new(config(dir), Box::new(source), Box::new(RuleBasedAnalyzer::default()))
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, s).unwrap()
    }

    #[test]
    fn test_tick_continues_past_failing_robot() {
        let dir = TempDir::new().unwrap();
        let hot = Metrics {
            temperature: 65.0,
            ..Metrics::default()
        };
        let monitor = monitor(&dir, hot, &["robot-002"]);

        let outcomes = monitor.tick_at(at(3, 0, 0));
        let ids: Vec<&str> = outcomes.iter().map(|o| o.robot_id.as_str()).collect();
        assert_eq!(ids, vec!["robot-001", "robot-003"]);
        assert_eq!(monitor.status().reports_emitted, 2);
    }

    #[test]
    fn test_history_is_capped_across_ticks() {
        let dir = TempDir::new().unwrap();
        let monitor = monitor(&dir, Metrics::default(), &[]);
        for i in 0..12 {
            monitor.tick_at(at(3, i, 0));
        }
        assert_eq!(monitor.history_len("robot-001", "head"), 10);
    }

    #[test]
    fn test_unknown_robot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let monitor = monitor(&dir, Metrics::default(), &[]);
        assert!(matches!(
            monitor.check_robot_at("robot-999", at(3, 0, 0)),
            Err(MonitorError::UnknownRobot(_))
        ));
    }

    #[test]
    fn test_degraded_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();

        let hot = Metrics {
            temperature: 65.0,
            ..Metrics::default()
        };
        let monitor = monitor(&dir, hot, &[]);
        let outcome = monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();

        assert_eq!(outcome.critical_count, 1);
        assert_eq!(outcome.emissions, vec![Emission::Disabled]);
        let status = monitor.status();
        assert!(status.degraded);
        assert_eq!(status.reports_emitted, 0);
        assert!(status.last_report_times.is_empty());
        assert!(!dir.path().join("system_monitor.log").exists());
    }

    #[test]
    fn test_failed_write_leaves_dedup_untouched() {
        let dir = TempDir::new().unwrap();
        let hot = Metrics {
            temperature: 65.0,
            ..Metrics::default()
        };
        let monitor = monitor(&dir, hot, &[]);

        // Replace the reports directory with a file after the sink was opened
        let reports = dir.path().join("reports");
        fs::remove_dir_all(&reports).unwrap();
        fs::write(&reports, "blocked").unwrap();

        let outcome = monitor.check_robot_at("robot-001", at(3, 0, 0)).unwrap();
        assert!(matches!(outcome.emissions[0], Emission::Failed { .. }));
        assert!(monitor.status().last_report_times.is_empty());

        // Once writable again, the next tick retries immediately
        fs::remove_file(&reports).unwrap();
        fs::create_dir(&reports).unwrap();
        let outcome = monitor.check_robot_at("robot-001", at(3, 0, 10)).unwrap();
        assert_eq!(outcome.written().len(), 1);
    }

    #[test]
    fn test_status_reports_interval_and_source() {
        let dir = TempDir::new().unwrap();
        let monitor = Monitor::new(
            config(&dir),
            Box::new(SimulatedSource::with_seed(Thresholds::default(), 3)),
            Box::new(RuleBasedAnalyzer::default()),
        );
        let status = monitor.status();
        assert!(!status.is_running);
        assert_eq!(status.tick_interval, "every 5s");
        assert_eq!(status.source, "simulated (seed 3)");
        assert!(!status.degraded);
    }

    #[tokio::test]
    async fn test_start_purges_and_stop_halts() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.tick_interval = Duration::from_secs(3600);
        let monitor = Monitor::new(
            cfg,
            Box::new(FixedSource {
                metrics: Metrics::default(),
                failing: Vec::new(),
            }),
            Box::new(RuleBasedAnalyzer::default()),
        );

        let reports = dir.path().join("reports");
        fs::write(reports.join("stale.txt"), "old").unwrap();
        fs::create_dir_all(reports.join("nested")).unwrap();

        monitor.start().unwrap();
        assert!(monitor.is_running());
        assert!(matches!(monitor.start(), Err(MonitorError::AlreadyRunning)));
        assert_eq!(fs::read_dir(&reports).unwrap().count(), 0);

        assert!(monitor.stop());
        assert!(!monitor.is_running());
        assert!(!monitor.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_ticks_on_interval() {
        let dir = TempDir::new().unwrap();
        let hot = Metrics {
            temperature: 65.0,
            ..Metrics::default()
        };
        let monitor = monitor(&dir, hot, &[]);

        monitor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        monitor.stop();

        // One tick after 5s, one report per robot
        let status = monitor.status();
        assert_eq!(status.reports_emitted, 3);
        assert_eq!(monitor.history_len("robot-001", "head"), 1);
    }

    #[tokio::test]
    async fn test_start_rejects_zero_interval() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.tick_interval = Duration::ZERO;
        let monitor = Monitor::new(
            cfg,
            Box::new(FixedSource {
                metrics: Metrics::default(),
                failing: Vec::new(),
            }),
            Box::new(RuleBasedAnalyzer::default()),
        );

        assert!(matches!(monitor.start(), Err(MonitorError::InvalidInterval)));
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_scheduled_tick_after_stop_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.tick_interval = Duration::from_secs(3600);
        let hot = Metrics {
            temperature: 65.0,
            ..Metrics::default()
        };
        let monitor = Monitor::new(
            cfg,
            Box::new(FixedSource {
                metrics: hot,
                failing: Vec::new(),
            }),
            Box::new(RuleBasedAnalyzer::default()),
        );

        monitor.start().unwrap();
        assert_eq!(monitor.scheduled_tick(at(3, 0, 0)).len(), 3);
        monitor.stop();

        assert!(monitor.scheduled_tick(at(3, 10, 0)).is_empty());
        assert_eq!(monitor.status().reports_emitted, 3);
        assert_eq!(monitor.history_len("robot-001", "head"), 1);
    }
}
