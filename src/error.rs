//! Error types for telemetry sources and the monitor.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when fetching a robot snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has no data for the requested robot.
    #[error("No telemetry available for robot {0}")]
    NoData(String),

    /// The source itself is unreachable or closed.
    #[error("Telemetry source unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`Monitor`](crate::monitor::Monitor) operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The robot id is not part of the configured roster.
    #[error("Unknown robot: {0}")]
    UnknownRobot(String),

    /// `start` was called on a monitor that is already ticking.
    #[error("Monitor is already running")]
    AlreadyRunning,

    /// The scheduler cannot tick on a zero interval.
    #[error("Tick interval must be greater than zero")]
    InvalidInterval,

    /// Fetching telemetry failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A report or log file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MonitorError::Io {
            path: path.into(),
            source,
        }
    }
}
