//! # partwatch
//!
//! Condition monitoring for a fleet of industrial robots.
//!
//! A [`Monitor`] periodically pulls a telemetry snapshot for every robot,
//! classifies each part against configurable [`Thresholds`], keeps a short
//! per-part history and writes a plain-text incident report when parts go
//! critical or cross their warning limits. Reports for the same robot are
//! suppressed for a few minutes so a persistent fault produces one report,
//! not one per tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Monitor                             │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │ source  │───▶│ monitor  │───▶│ analysis │───▶│ report  │  │
//! │  │ (input) │    │(evaluate)│    │ (advice) │    │ (files) │  │
//! │  └─────────┘    └────┬─────┘    └──────────┘    └─────────┘  │
//! │                      │                                       │
//! │                      ▼                                       │
//! │                 ┌─────────┐                                  │
//! │                 │  data   │◀── History | Thresholds          │
//! │                 └─────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`TelemetrySource`] trait with a seeded simulator
//!   and a channel-fed source for external telemetry
//! - **[`data`]**: readings, thresholds, status classification and history
//! - **[`monitor`]**: scheduling, evaluation and report deduplication
//! - **[`analysis`]**: the [`Analyzer`] seam and its rule-based default
//! - **[`report`]**: report rendering and the filesystem sink
//! - **[`config`]**: settings from file and environment
//!
//! ## Usage
//!
//! ```no_run
//! use partwatch::{Monitor, MonitorConfig, RuleBasedAnalyzer, SimulatedSource, Thresholds};
//!
//! # tokio_test::block_on(async {
//! let source = SimulatedSource::new(Thresholds::default());
//! let monitor = Monitor::new(
//!     MonitorConfig::default(),
//!     Box::new(source),
//!     Box::new(RuleBasedAnalyzer::default()),
//! );
//!
//! monitor.start().unwrap();
//! // ...
//! monitor.stop();
//! # });
//! ```
//!
//! ### Feeding external telemetry
//!
//! ```no_run
//! use partwatch::{ChannelSource, Monitor, MonitorConfig, RuleBasedAnalyzer};
//!
//! let (tx, source) = ChannelSource::create("plant-gateway");
//! let monitor = Monitor::new(
//!     MonitorConfig::default(),
//!     Box::new(source),
//!     Box::new(RuleBasedAnalyzer::default()),
//! );
//! // tx.send(feed) with a map of robot id to snapshot, then monitor.tick()
//! # drop((tx, monitor));
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod report;
pub mod source;

pub use analysis::{Analysis, Analyzer, RuleBasedAnalyzer};
pub use config::{MonitorConfig, Settings};
pub use data::{
    History, Metrics, PartReading, PartStatus, RobotIdentity, RobotSnapshot, SpikeFlags,
    Thresholds,
};
pub use error::{MonitorError, SourceError};
pub use monitor::{CheckOutcome, Emission, Monitor, MonitorStatus};
pub use report::{Report, ReportSink, ReportZone, Severity};
pub use source::{ChannelSource, SimulatedSource, TelemetryFeed, TelemetrySource};
