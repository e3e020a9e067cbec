//! Fall confirmation state machine.
//!
//! A fall is confirmed only by the full kinematic sequence: near-weightless
//! free fall, a hard impact within a short window, then sustained stillness.
//! Any single-threshold test on deceleration alone flags ordinary movement
//! far too often; each stage here gates the next.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::domain::SensorReading;

/// Standard gravity in m/s²; all fall thresholds are multiples of it.
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Configuration for fall detection behaviour.
#[derive(Debug, Clone)]
pub struct FallConfig {
    /// Acceleration magnitude below this suggests free fall (m/s², default 0.5 g).
    pub free_fall_threshold: f64,
    /// Acceleration magnitude above this counts as an impact (m/s², default 2.5 g).
    pub impact_threshold: f64,
    /// Readings below this magnitude count as still (m/s², default 0.8 g).
    pub inactivity_threshold: f64,
    /// The impact must follow the free-fall onset within this window (default 1000 ms).
    pub impact_window_ms: i64,
    /// Minimum stillness duration after impact before confirming (default 10 s).
    pub stillness_min_secs: i64,
    /// Number of most recent readings that must all be still (default 10).
    pub stillness_samples: usize,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            free_fall_threshold: 0.5 * STANDARD_GRAVITY,
            impact_threshold: 2.5 * STANDARD_GRAVITY,
            inactivity_threshold: 0.8 * STANDARD_GRAVITY,
            impact_window_ms: 1_000,
            stillness_min_secs: 10,
            stillness_samples: 10,
        }
    }
}

/// Current phase of the per-device fall state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallPhase {
    /// No fall precursor observed.
    Idle,
    /// Magnitude dropped below the free-fall threshold; awaiting impact.
    FreeFallSuspected {
        /// Instant the free-fall signature was first seen.
        since: DateTime<Utc>,
    },
    /// Impact observed in time; awaiting post-impact stillness.
    ImpactSuspected {
        /// Instant of the impact reading.
        since: DateTime<Utc>,
    },
}

/// Steps the fall state machine over incoming readings.
///
/// The transition function is pure: it consumes the previous phase and the
/// updated history window and returns the next phase plus a one-shot
/// confirmation signal. The caller owns the phase between steps.
#[derive(Debug, Clone)]
pub struct FallDetector {
    config: FallConfig,
}

impl FallDetector {
    /// Create a new fall detector.
    pub fn new(config: FallConfig) -> Self {
        Self { config }
    }

    /// Advance the state machine with a freshly arrived reading.
    ///
    /// `history` is the device's rolling window, newest at the back, and must
    /// already contain `reading`. Returns the next phase and `true` exactly
    /// once per confirmed fall.
    pub fn step(
        &self,
        phase: FallPhase,
        reading: &SensorReading,
        history: &VecDeque<SensorReading>,
    ) -> (FallPhase, bool) {
        let magnitude = reading.accel_magnitude();
        let now = reading.observed_at;

        match phase {
            FallPhase::Idle => {
                if magnitude < self.config.free_fall_threshold {
                    (FallPhase::FreeFallSuspected { since: now }, false)
                } else {
                    (FallPhase::Idle, false)
                }
            }

            FallPhase::FreeFallSuspected { since } => {
                let elapsed_ms = (now - since).num_milliseconds();
                if magnitude > self.config.impact_threshold
                    && elapsed_ms <= self.config.impact_window_ms
                {
                    (FallPhase::ImpactSuspected { since: now }, false)
                } else if elapsed_ms > self.config.impact_window_ms {
                    // Window elapsed without an impact
                    (FallPhase::Idle, false)
                } else {
                    (FallPhase::FreeFallSuspected { since }, false)
                }
            }

            FallPhase::ImpactSuspected { since } => {
                if magnitude >= self.config.inactivity_threshold {
                    // Movement resumed before confirmation
                    return (FallPhase::Idle, false);
                }

                let still_long_enough =
                    (now - since).num_seconds() >= self.config.stillness_min_secs;
                let enough_samples = history.len() >= self.config.stillness_samples;
                let all_still = history
                    .iter()
                    .rev()
                    .take(self.config.stillness_samples)
                    .all(|r| r.accel_magnitude() < self.config.inactivity_threshold);

                if still_long_enough && enough_samples && all_still {
                    (FallPhase::Idle, true)
                } else {
                    (FallPhase::ImpactSuspected { since }, false)
                }
            }
        }
    }
}
