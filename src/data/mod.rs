//! Data models for robot telemetry.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "5m")
//! - [`history`]: Bounded per-part history used for trend detection
//! - [`telemetry`]: Core data models ([`PartReading`], [`RobotSnapshot`], [`PartStatus`])
//!   and threshold classification
//!
//! ## Data Flow
//!
//! ```text
//! TelemetrySource::fetch()
//!        │
//!        ▼
//! RobotSnapshot (PartReading status computed from Thresholds)
//!        │
//!        ├──▶ evaluator (critical / warning / sustained anomalies)
//!        │
//!        └──▶ History::record() (max 10 entries per part)
//! ```

pub mod duration;
pub mod history;
pub mod telemetry;

pub use history::{History, HistoryEntry, MAX_HISTORY_SIZE};
pub use telemetry::{
    Metric, Metrics, PartReading, PartStatus, RobotIdentity, RobotSnapshot, SpikeFlags,
    Thresholds, Violation,
};
