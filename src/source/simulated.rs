//! Synthetic telemetry generator.
//!
//! Every reading is derived from a single seed drawn uniformly from
//! `0..1000`; see [`reading_from_seed`] for the derivation.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::TelemetrySource;
use crate::data::{Metrics, PartReading, RobotIdentity, RobotSnapshot, SpikeFlags, Thresholds};
use crate::error::SourceError;

/// Parts present on every simulated robot, as `(id, name)`.
pub const PART_ROSTER: [(&str, &str); 7] = [
    ("head", "Head Unit"),
    ("shoulder", "Shoulder Joint"),
    ("elbow", "Elbow Joint"),
    ("wrist", "Wrist Joint"),
    ("gripper", "Gripper"),
    ("base", "Base Motor"),
    ("controller", "Control Unit"),
];

/// Exclusive upper bound of the per-reading seed.
const SEED_RANGE: u32 = 1000;

/// Derive one reading from a seed.
///
/// ```text
/// temperature    = 35 + seed % 20, +20 when seed % 10 == 0 (spike)
/// vibration      = 0.1 + (seed % 30) / 200, spike when seed % 13 == 0
/// humidity       = 40 + seed % 30, spike when seed % 17 == 0
/// operatingHours = 1 + seed % 48
/// voltage        = 24 - (seed % 8) / 10
/// cpuLoad        = 30 + seed % 70
/// abnormalNoise  = seed % 19 == 0
/// ```
pub fn reading_from_seed(
    part_id: &str,
    part_name: &str,
    seed: u32,
    thresholds: &Thresholds,
    at: DateTime<Utc>,
) -> PartReading {
    let temperature_spike = seed % 10 == 0;
    let mut temperature = 35.0 + f64::from(seed % 20);
    if temperature_spike {
        temperature += 20.0;
    }

    let metrics = Metrics {
        temperature,
        vibration: 0.1 + f64::from(seed % 30) / 200.0,
        humidity: 40.0 + f64::from(seed % 30),
        operating_hours: 1 + seed % 48,
        voltage: 24.0 - f64::from(seed % 8) / 10.0,
        cpu_load: 30.0 + f64::from(seed % 70),
        abnormal_noise: seed % 19 == 0,
    };
    let spikes = SpikeFlags {
        temperature: temperature_spike,
        vibration: seed % 13 == 0,
        humidity: seed % 17 == 0,
    };

    PartReading::measure(part_id, part_name, metrics, spikes, thresholds, at)
}

/// A telemetry source producing random readings for a fixed part roster.
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
    thresholds: Thresholds,
    description: String,
}

impl SimulatedSource {
    /// Create a simulator seeded from the operating system.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            thresholds,
            description: "simulated".to_string(),
        }
    }

    /// Create a deterministic simulator.
    pub fn with_seed(thresholds: Thresholds, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            thresholds,
            description: format!("simulated (seed {})", seed),
        }
    }
}

impl TelemetrySource for SimulatedSource {
    fn fetch(
        &mut self,
        robot: &RobotIdentity,
        now: DateTime<Utc>,
    ) -> Result<RobotSnapshot, SourceError> {
        let parts = PART_ROSTER
            .iter()
            .map(|(id, name)| {
                let seed = self.rng.random_range(0..SEED_RANGE);
                reading_from_seed(id, name, seed, &self.thresholds, now)
            })
            .collect();

        Ok(RobotSnapshot {
            robot_id: robot.id.clone(),
            robot_name: robot.name.clone(),
            parts,
            last_check: now,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}
