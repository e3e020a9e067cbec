//! Windowed vital-sign analysis.
//!
//! Both checks are stateless per call and idempotent given the same window
//! contents: they are recomputed from the device's rolling history on every
//! reading, so transient sensor noise needs to be sustained before it flags.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::domain::{SensorReading, Thresholds};

/// Configuration for vital-sign analysis.
#[derive(Debug, Clone)]
pub struct VitalsConfig {
    /// Heart-rate evaluation window (default 30 s).
    pub hr_window_secs: i64,
    /// Minimum heart-rate samples inside the window (default 5).
    pub min_hr_samples: usize,
    /// Fraction of out-of-bounds samples that must be exceeded (default 0.7, strict).
    pub abnormal_hr_ratio: f64,
    /// Lower heart-rate bound (bpm, default 40).
    pub min_hr: f64,
    /// Oxygen evaluation window (default 10 s).
    pub oxygen_window_secs: i64,
    /// Minimum oxygen samples inside the window (default 3).
    pub min_oxygen_samples: usize,
    /// Blood-oxygen floor in percent (default 90).
    pub spo2_floor: f64,
    /// Age assumed when the directory has no record (default 50).
    pub default_age: u8,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            hr_window_secs: 30,
            min_hr_samples: 5,
            abnormal_hr_ratio: 0.7,
            min_hr: 40.0,
            oxygen_window_secs: 10,
            min_oxygen_samples: 3,
            spo2_floor: 90.0,
            default_age: 50,
        }
    }
}

/// Evaluates the rolling window for heart-rate and oxygen anomalies.
#[derive(Debug, Clone)]
pub struct VitalSignAnalyzer {
    config: VitalsConfig,
}

impl VitalSignAnalyzer {
    /// Create a new analyzer.
    pub fn new(config: VitalsConfig) -> Self {
        Self { config }
    }

    /// Threshold set personalized for the given patient age.
    pub fn thresholds_for(&self, age: Option<u8>) -> Thresholds {
        Thresholds::for_age(
            age,
            self.config.default_age,
            self.config.min_hr,
            self.config.spo2_floor,
        )
    }

    /// Sustained abnormal heart rate.
    ///
    /// Requires at least `min_hr_samples` readings inside the window; flags
    /// when the fraction outside `[min_hr, max_hr]` is strictly above
    /// `abnormal_hr_ratio`. A momentary spike among normal samples never
    /// trips this.
    pub fn abnormal_heart_rate(
        &self,
        history: &VecDeque<SensorReading>,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> bool {
        let samples: Vec<f64> = history
            .iter()
            .filter(|r| (now - r.observed_at).num_seconds() < self.config.hr_window_secs)
            .map(|r| r.heart_rate)
            .collect();

        if samples.len() < self.config.min_hr_samples {
            return false;
        }

        let abnormal = samples
            .iter()
            .filter(|&&bpm| thresholds.heart_rate_abnormal(bpm))
            .count();

        abnormal as f64 / samples.len() as f64 > self.config.abnormal_hr_ratio
    }

    /// Sustained low blood-oxygen saturation.
    ///
    /// Requires at least `min_oxygen_samples` readings inside the (shorter)
    /// oxygen window; flags when the minimum sampled value is below the
    /// floor. Reacts to sustained desaturation faster than an average would,
    /// while a lone dip cannot reach the sample minimum.
    pub fn low_oxygen(
        &self,
        history: &VecDeque<SensorReading>,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> bool {
        let samples: Vec<f64> = history
            .iter()
            .filter(|r| (now - r.observed_at).num_seconds() < self.config.oxygen_window_secs)
            .map(|r| r.oxygen)
            .collect();

        if samples.len() < self.config.min_oxygen_samples {
            return false;
        }

        samples
            .iter()
            .fold(f64::INFINITY, |min, &v| min.min(v))
            < thresholds.spo2_floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(heart_rate: f64, oxygen: f64, secs: i64) -> SensorReading {
        SensorReading {
            device_code: "D1".to_string(),
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 9.8,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            heart_rate,
            oxygen,
            observed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn history(entries: &[(f64, f64, i64)]) -> VecDeque<SensorReading> {
        entries.iter().map(|&(hr, ox, t)| reading(hr, ox, t)).collect()
    }

    fn analyzer() -> VitalSignAnalyzer {
        VitalSignAnalyzer::new(VitalsConfig::default())
    }

    fn now(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_heart_rate_needs_minimum_samples() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // 4 wildly abnormal samples: below the 5-sample minimum
        let h = history(&[(200.0, 97.0, 1), (200.0, 97.0, 2), (200.0, 97.0, 3), (200.0, 97.0, 4)]);
        assert!(!a.abnormal_heart_rate(&h, now(5), &t));
    }

    #[test]
    fn test_heart_rate_ratio_boundary_is_strict() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50)); // max_hr = 170

        // Exactly 7 of 10 abnormal: 70 % precisely, must not flag
        let mut entries: Vec<(f64, f64, i64)> = Vec::new();
        for i in 0..7 {
            entries.push((200.0, 97.0, i));
        }
        for i in 7..10 {
            entries.push((70.0, 97.0, i));
        }
        let h = history(&entries);
        assert!(!a.abnormal_heart_rate(&h, now(10), &t));

        // 8 of 10: strictly above, flags
        let mut entries: Vec<(f64, f64, i64)> = Vec::new();
        for i in 0..8 {
            entries.push((200.0, 97.0, i));
        }
        for i in 8..10 {
            entries.push((70.0, 97.0, i));
        }
        let h = history(&entries);
        assert!(a.abnormal_heart_rate(&h, now(10), &t));
    }

    #[test]
    fn test_heart_rate_counts_low_and_high_outliers() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // 3 tachycardic + 2 bradycardic of 6 is over 70 %? 5/6 ≈ 83 %
        let h = history(&[
            (200.0, 97.0, 1),
            (200.0, 97.0, 2),
            (200.0, 97.0, 3),
            (30.0, 97.0, 4),
            (30.0, 97.0, 5),
            (70.0, 97.0, 6),
        ]);
        assert!(a.abnormal_heart_rate(&h, now(7), &t));
    }

    #[test]
    fn test_heart_rate_window_excludes_stale_samples() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // 5 abnormal samples, but 3 of them are older than 30 s; only 2
        // remain in the window, below the minimum
        let h = history(&[
            (200.0, 97.0, 0),
            (200.0, 97.0, 1),
            (200.0, 97.0, 2),
            (200.0, 97.0, 40),
            (200.0, 97.0, 41),
        ]);
        assert!(!a.abnormal_heart_rate(&h, now(45), &t));
    }

    #[test]
    fn test_low_oxygen_needs_three_samples() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // Two desaturated samples never flag, regardless of value
        let h = history(&[(72.0, 60.0, 1), (72.0, 60.0, 2)]);
        assert!(!a.low_oxygen(&h, now(3), &t));
    }

    #[test]
    fn test_low_oxygen_minimum_over_window() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // A single 89 among three samples flags
        let h = history(&[(72.0, 95.0, 1), (72.0, 89.0, 2), (72.0, 95.0, 3)]);
        assert!(a.low_oxygen(&h, now(4), &t));

        // 90 exactly is not below the floor
        let h = history(&[(72.0, 95.0, 1), (72.0, 90.0, 2), (72.0, 95.0, 3)]);
        assert!(!a.low_oxygen(&h, now(4), &t));
    }

    #[test]
    fn test_low_oxygen_window_is_short() {
        let a = analyzer();
        let t = a.thresholds_for(Some(50));

        // The desaturated sample is 15 s old: outside the 10 s window, and
        // only two in-window samples remain
        let h = history(&[(72.0, 85.0, 0), (72.0, 97.0, 10), (72.0, 97.0, 12)]);
        assert!(!a.low_oxygen(&h, now(15), &t));
    }
}
