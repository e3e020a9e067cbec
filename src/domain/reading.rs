//! Telemetry samples as delivered by the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single decoded telemetry sample from a wearable device.
///
/// Field names mirror the transport's JSON payload (`accelX`, `heartRate`,
/// ...). Acceleration is in m/s² on all three axes; the device never sends a
/// timestamp, so `observed_at` is stamped at ingestion. Immutable once
/// constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Stable identifier of the reporting device.
    pub device_code: String,
    /// Acceleration along the X axis (m/s²).
    #[serde(rename = "accelX")]
    pub accel_x: f64,
    /// Acceleration along the Y axis (m/s²).
    #[serde(rename = "accelY")]
    pub accel_y: f64,
    /// Acceleration along the Z axis (m/s²).
    #[serde(rename = "accelZ")]
    pub accel_z: f64,
    /// Angular velocity around the X axis (rad/s).
    #[serde(rename = "gyroX")]
    pub gyro_x: f64,
    /// Angular velocity around the Y axis (rad/s).
    #[serde(rename = "gyroY")]
    pub gyro_y: f64,
    /// Angular velocity around the Z axis (rad/s).
    #[serde(rename = "gyroZ")]
    pub gyro_z: f64,
    /// Heart rate in beats per minute.
    #[serde(rename = "heartRate")]
    pub heart_rate: f64,
    /// Blood-oxygen saturation in percent.
    pub oxygen: f64,
    /// Ingestion timestamp; not part of the device payload.
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl SensorReading {
    /// Decode a raw transport payload.
    ///
    /// Payloads missing any required numeric field fail here and never reach
    /// the device state store. `observed_at` is stamped with the current time
    /// unless the payload carries one (test fixtures do).
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Euclidean norm of the three acceleration axes (m/s²).
    ///
    /// All fall thresholds compare against this magnitude; axis signs and
    /// device orientation cancel out.
    pub fn accel_magnitude(&self) -> f64 {
        (self.accel_x * self.accel_x + self.accel_y * self.accel_y + self.accel_z * self.accel_z)
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wire_payload() {
        let payload = br#"{
            "device_code": "D1",
            "accelX": 0.1, "accelY": 0.2, "accelZ": 9.8,
            "gyroX": 0.0, "gyroY": 0.0, "gyroZ": 0.0,
            "heartRate": 72.0, "oxygen": 97.0
        }"#;

        let reading = SensorReading::decode(payload).unwrap();
        assert_eq!(reading.device_code, "D1");
        assert_eq!(reading.heart_rate, 72.0);
        assert_eq!(reading.oxygen, 97.0);
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        // No heartRate
        let payload = br#"{
            "device_code": "D1",
            "accelX": 0.1, "accelY": 0.2, "accelZ": 9.8,
            "gyroX": 0.0, "gyroY": 0.0, "gyroZ": 0.0,
            "oxygen": 97.0
        }"#;

        assert!(SensorReading::decode(payload).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SensorReading::decode(b"not json").is_err());
    }

    #[test]
    fn test_accel_magnitude() {
        let payload = br#"{
            "device_code": "D1",
            "accelX": 3.0, "accelY": 4.0, "accelZ": 0.0,
            "gyroX": 0.0, "gyroY": 0.0, "gyroZ": 0.0,
            "heartRate": 72.0, "oxygen": 97.0
        }"#;

        let reading = SensorReading::decode(payload).unwrap();
        assert!((reading.accel_magnitude() - 5.0).abs() < f64::EPSILON);
    }
}
