//! Per-evaluation vital-sign thresholds.

/// Heart-rate and oxygen bounds for one evaluation.
///
/// Recomputed from patient age on every call, never persisted. The maximum
/// heart rate follows the age-predicted formula `220 - age`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Upper heart-rate bound (bpm).
    pub max_hr: f64,
    /// Lower heart-rate bound (bpm).
    pub min_hr: f64,
    /// Blood-oxygen floor (percent).
    pub spo2_floor: f64,
}

impl Thresholds {
    /// Build a threshold set for a patient of the given age.
    ///
    /// `age` falls back to `default_age` when the directory has no record for
    /// the device.
    pub fn for_age(age: Option<u8>, default_age: u8, min_hr: f64, spo2_floor: f64) -> Self {
        let age = age.unwrap_or(default_age);
        Self {
            max_hr: 220.0 - f64::from(age),
            min_hr,
            spo2_floor,
        }
    }

    /// True if the heart rate lies outside `[min_hr, max_hr]`.
    pub fn heart_rate_abnormal(&self, bpm: f64) -> bool {
        bpm > self.max_hr || bpm < self.min_hr
    }
}
