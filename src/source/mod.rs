//! Telemetry source abstraction.
//!
//! The monitor never generates readings itself; it asks a
//! [`TelemetrySource`] for one [`RobotSnapshot`] per robot per tick.
//! [`SimulatedSource`] produces synthetic readings, [`ChannelSource`]
//! forwards snapshots pushed by an external sensor client.

mod channel;
mod simulated;

pub use channel::{ChannelSource, TelemetryFeed};
pub use simulated::{reading_from_seed, SimulatedSource, PART_ROSTER};

use std::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::data::{RobotIdentity, RobotSnapshot};
use crate::error::SourceError;

/// Trait for obtaining robot telemetry from various backends.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use partwatch::data::{RobotIdentity, Thresholds};
/// use partwatch::source::{SimulatedSource, TelemetrySource};
///
/// let mut source = SimulatedSource::with_seed(Thresholds::default(), 7);
/// let robot = RobotIdentity::new("robot-001", "Assembly Robot A");
/// let snapshot = source.fetch(&robot, Utc::now()).unwrap();
/// assert_eq!(snapshot.parts.len(), 7);
/// ```
pub trait TelemetrySource: Send + Debug {
    /// Fetch the current snapshot for `robot`, stamped with `now`.
    fn fetch(
        &mut self,
        robot: &RobotIdentity,
        now: DateTime<Utc>,
    ) -> Result<RobotSnapshot, SourceError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
