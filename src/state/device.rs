//! Rolling state for a single device.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::detection::FallPhase;
use crate::domain::SensorReading;

/// Engine-local state for one device.
///
/// Purely transient: created lazily on the first reading, mutated on every
/// subsequent one, and dropped by the eviction sweep once the device goes
/// quiet. Everything here is derivable from future readings, so loss on
/// eviction is acceptable.
#[derive(Debug, Clone)]
pub struct DeviceState {
    history: VecDeque<SensorReading>,
    fall_phase: FallPhase,
    last_activity_at: DateTime<Utc>,
}

impl DeviceState {
    /// Create state for a previously unseen device.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            history: VecDeque::new(),
            fall_phase: FallPhase::Idle,
            last_activity_at: now,
        }
    }

    /// Append a reading and prune entries older than the retention window.
    ///
    /// The window must cover the longest detector lookback (the 30 s vitals
    /// window under the defaults). Pruning runs on every update, so the
    /// window also bounds per-device memory.
    pub fn push(&mut self, reading: SensorReading, window_secs: i64) {
        self.last_activity_at = reading.observed_at;

        let cutoff = reading.observed_at - Duration::seconds(window_secs);
        self.history.push_back(reading);
        while let Some(front) = self.history.front() {
            if front.observed_at <= cutoff {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// The rolling window, oldest at the front.
    pub fn history(&self) -> &VecDeque<SensorReading> {
        &self.history
    }

    /// Current phase of the fall state machine.
    pub fn fall_phase(&self) -> FallPhase {
        self.fall_phase
    }

    /// Store the phase returned by the fall detector.
    pub fn set_fall_phase(&mut self, phase: FallPhase) {
        self.fall_phase = phase;
    }

    /// Timestamp of the most recent reading.
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// How long the device has been quiet.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(secs: i64) -> SensorReading {
        SensorReading {
            device_code: "D1".to_string(),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 9.8,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            heart_rate: 72.0,
            oxygen: 97.0,
            observed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_push_prunes_by_age() {
        let mut state = DeviceState::new(Utc.timestamp_opt(0, 0).unwrap());

        for t in [0, 10, 20, 35, 40] {
            state.push(reading(t), 30);
        }

        // Readings at 0 and 10 are at least 30 s older than the latest
        let times: Vec<i64> = state.history().iter().map(|r| r.observed_at.timestamp()).collect();
        assert_eq!(times, vec![20, 35, 40]);
        assert_eq!(state.last_activity_at().timestamp(), 40);
    }

    #[test]
    fn test_idle_for() {
        let mut state = DeviceState::new(Utc.timestamp_opt(0, 0).unwrap());
        state.push(reading(5), 30);

        let idle = state.idle_for(Utc.timestamp_opt(65, 0).unwrap());
        assert_eq!(idle.num_seconds(), 60);
    }
}
