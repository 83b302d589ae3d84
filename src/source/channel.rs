//! Channel-based telemetry source.
//!
//! Receives robot snapshots via a tokio watch channel. This is the
//! integration point for a real sensor client: the client pushes the
//! latest snapshot per robot and the monitor reads whatever is current
//! when it ticks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::TelemetrySource;
use crate::data::{RobotIdentity, RobotSnapshot};
use crate::error::SourceError;

/// Latest snapshot per robot id.
pub type TelemetryFeed = BTreeMap<String, RobotSnapshot>;

/// A telemetry source fed through a channel.
///
/// # Example
///
/// ```
/// use partwatch::source::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("plc-gateway");
/// tx.send_modify(|feed| feed.clear());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<TelemetryFeed>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source from the receiving end of a watch channel.
    pub fn new(receiver: watch::Receiver<TelemetryFeed>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair.
    ///
    /// Returns (sender, source) where the sender is used to publish
    /// snapshots and the source is handed to the monitor.
    pub fn create(source_description: &str) -> (watch::Sender<TelemetryFeed>, Self) {
        let (tx, rx) = watch::channel(TelemetryFeed::new());
        (tx, Self::new(rx, source_description))
    }
}

impl TelemetrySource for ChannelSource {
    fn fetch(
        &mut self,
        robot: &RobotIdentity,
        _now: DateTime<Utc>,
    ) -> Result<RobotSnapshot, SourceError> {
        if self.receiver.has_changed().is_err() {
            return Err(SourceError::Unavailable(self.description.clone()));
        }

        self.receiver
            .borrow_and_update()
            .get(&robot.id)
            .cloned()
            .ok_or_else(|| SourceError::NoData(robot.id.clone()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
