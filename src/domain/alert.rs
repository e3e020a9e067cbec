//! Alert documents and their outbound notice projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Condition, SensorReading};

/// Unique identifier for an alert document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Create a new random alert ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The durable alert record for one device.
///
/// At most one unresolved alert exists per device. Condition kinds are
/// recorded in insertion order, never duplicated, and never removed before
/// resolution. Once resolved the record is immutable; a later detection
/// creates a brand-new alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    device_code: String,
    #[serde(rename = "alertType")]
    conditions: Vec<Condition>,
    #[serde(rename = "alertData")]
    last_reading: SensorReading,
    resolved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Alert {
    /// Open a new unresolved alert for the detected conditions.
    pub fn new(device_code: impl Into<String>, conditions: Vec<Condition>, reading: SensorReading) -> Self {
        let now = reading.observed_at;
        Self {
            id: AlertId::new(),
            device_code: device_code.into(),
            conditions,
            last_reading: reading,
            resolved: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the alert ID.
    pub fn id(&self) -> &AlertId {
        &self.id
    }

    /// Get the device this alert belongs to.
    pub fn device_code(&self) -> &str {
        &self.device_code
    }

    /// Recorded condition kinds, in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The most recent reading attached to the alert.
    pub fn last_reading(&self) -> &SensorReading {
        &self.last_reading
    }

    /// Whether the alert has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Get creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get last update time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True if the alert already records the given condition kind.
    pub fn records(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    /// Merge freshly detected conditions into the record.
    ///
    /// Returns the kinds that were not yet recorded, in detection order.
    /// Already-recorded kinds are ignored, so replaying a detection is a
    /// no-op. `last_reading` and `updated_at` refresh only when something new
    /// was added. Resolved alerts never change.
    pub fn merge(&mut self, detected: &[Condition], reading: &SensorReading) -> Vec<Condition> {
        if self.resolved {
            return Vec::new();
        }

        let newly: Vec<Condition> = detected
            .iter()
            .copied()
            .filter(|c| !self.conditions.contains(c))
            .collect();

        if !newly.is_empty() {
            self.conditions.extend(newly.iter().copied());
            self.last_reading = reading.clone();
            self.updated_at = reading.observed_at;
        }

        newly
    }

    /// Terminal transition: mark the alert resolved.
    pub fn resolve(&mut self) {
        self.resolved = true;
    }

    /// Project the alert into its outbound notice form.
    pub fn notice(&self) -> AlertNotice {
        AlertNotice {
            device_code: self.device_code.clone(),
            conditions: self.conditions.clone(),
            reading: self.last_reading.clone(),
            resolved: self.resolved,
            timestamp: self.updated_at,
        }
    }
}

/// Outbound alert notice published to the transport.
///
/// One notice is published per newly-added condition kind, each carrying the
/// full updated alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotice {
    /// Device the alert belongs to.
    pub device_code: String,
    /// All condition kinds recorded so far.
    #[serde(rename = "alertType")]
    pub conditions: Vec<Condition>,
    /// The reading that triggered the latest update.
    #[serde(rename = "alertData")]
    pub reading: SensorReading,
    /// Always false on publish; resolution is not notified.
    pub resolved: bool,
    /// Time of the update that produced this notice.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading_at(secs: i64) -> SensorReading {
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
    fn test_new_alert_is_unresolved() {
        let alert = Alert::new("D1", vec![Condition::Fall], reading_at(0));
        assert!(!alert.is_resolved());
        assert_eq!(alert.conditions(), &[Condition::Fall]);
        assert_eq!(alert.created_at(), alert.updated_at());
    }

    #[test]
    fn test_merge_appends_without_removing() {
        let mut alert = Alert::new("D1", vec![Condition::Fall], reading_at(0));

        let newly = alert.merge(&[Condition::Fall, Condition::LowOxygen], &reading_at(5));
        assert_eq!(newly, vec![Condition::LowOxygen]);
        assert_eq!(alert.conditions(), &[Condition::Fall, Condition::LowOxygen]);
        assert_eq!(alert.updated_at(), reading_at(5).observed_at);
    }

    #[test]
    fn test_merge_replay_is_noop() {
        let mut alert = Alert::new("D1", vec![Condition::Fall], reading_at(0));
        let before = alert.updated_at();

        let newly = alert.merge(&[Condition::Fall], &reading_at(5));
        assert!(newly.is_empty());
        // No refresh without new conditions
        assert_eq!(alert.updated_at(), before);
    }

    #[test]
    fn test_resolved_alert_is_immutable() {
        let mut alert = Alert::new("D1", vec![Condition::Fall], reading_at(0));
        alert.resolve();

        let newly = alert.merge(&[Condition::LowOxygen], &reading_at(5));
        assert!(newly.is_empty());
        assert_eq!(alert.conditions(), &[Condition::Fall]);
    }

    #[test]
    fn test_notice_wire_shape() {
        let alert = Alert::new("D1", vec![Condition::LowOxygen], reading_at(0));
        let json = serde_json::to_value(alert.notice()).unwrap();

        assert_eq!(json["device_code"], "D1");
        assert_eq!(json["alertType"][0], "Low Oxygen Level");
        assert_eq!(json["alertData"]["heartRate"], 72.0);
        assert_eq!(json["resolved"], false);
    }
}
