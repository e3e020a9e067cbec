//! Emergency condition kinds.

use serde::{Deserialize, Serialize};

/// A classified emergency condition for a device.
///
/// The serialized form is the human-readable label the downstream consumers
/// already key on, so the wire contract survives the enum refactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Confirmed fall (free-fall, impact, then sustained stillness).
    #[serde(rename = "Fall Detected")]
    Fall,
    /// Sustained heart rate outside the personalized bounds.
    #[serde(rename = "Abnormal Heart Rate")]
    AbnormalHeartRate,
    /// Blood-oxygen saturation below the floor.
    #[serde(rename = "Low Oxygen Level")]
    LowOxygen,
}

impl Condition {
    /// All condition kinds, in evaluation order.
    pub const ALL: [Condition; 3] = [
        Condition::Fall,
        Condition::AbnormalHeartRate,
        Condition::LowOxygen,
    ];

    /// Human-readable label; also the serialized wire form.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Fall => "Fall Detected",
            Condition::AbnormalHeartRate => "Abnormal Heart Rate",
            Condition::LowOxygen => "Low Oxygen Level",
        }
    }

    /// Transport channel the condition's notices are published to.
    ///
    /// Derived from the label: lower-cased, spaces to underscores, under the
    /// `alerts/` prefix (`alerts/fall_detected`).
    pub fn channel(&self) -> String {
        format!("alerts/{}", self.label().to_lowercase().replace(' ', "_"))
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_derivation() {
        assert_eq!(Condition::Fall.channel(), "alerts/fall_detected");
        assert_eq!(
            Condition::AbnormalHeartRate.channel(),
            "alerts/abnormal_heart_rate"
        );
        assert_eq!(Condition::LowOxygen.channel(), "alerts/low_oxygen_level");
    }

    #[test]
    fn test_serialized_form_is_label() {
        let json = serde_json::to_string(&Condition::LowOxygen).unwrap();
        assert_eq!(json, "\"Low Oxygen Level\"");

        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::LowOxygen);
    }
}
