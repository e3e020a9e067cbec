//! Alert lifecycle reconciliation.

use std::sync::Arc;

use crate::domain::{Alert, Condition, SensorReading};
use crate::EngineError;

use super::AlertStore;

/// Result of reconciling detected conditions against the open alert.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The persisted (or unchanged) alert after reconciliation.
    pub alert: Alert,
    /// Condition kinds recorded for the first time by this reconciliation.
    pub newly_added: Vec<Condition>,
    /// True when this reconciliation opened a brand-new alert.
    pub created: bool,
}

impl ReconcileOutcome {
    /// True when nothing new was recorded.
    pub fn is_unchanged(&self) -> bool {
        self.newly_added.is_empty()
    }
}

/// Merges detector outputs into the device's durable alert record.
///
/// Reconciliation always starts from a fresh store read, which is what makes
/// it idempotent: a condition already recorded on the open alert is never
/// re-added and never re-notified, and a store failure simply leaves the next
/// reading to retry against current store state.
pub struct AlertLifecycleManager {
    store: Arc<dyn AlertStore>,
}

impl AlertLifecycleManager {
    /// Create a manager over the given store collaborator.
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// Reconcile one reading's detected conditions for a device.
    ///
    /// Returns `None` when the device has no open alert and nothing was
    /// detected. The store write happens only when `newly_added` is
    /// non-empty, and always before any notification is dispatched.
    pub async fn reconcile(
        &self,
        device_code: &str,
        detected: &[Condition],
        reading: &SensorReading,
    ) -> Result<Option<ReconcileOutcome>, EngineError> {
        let existing = self.store.find_open_alert(device_code).await?;

        match existing {
            None => {
                if detected.is_empty() {
                    return Ok(None);
                }

                let alert = Alert::new(device_code, detected.to_vec(), reading.clone());
                self.store.save(&alert).await?;

                tracing::info!(
                    device_code,
                    alert_id = %alert.id(),
                    conditions = ?detected,
                    "opened new alert"
                );

                Ok(Some(ReconcileOutcome {
                    alert,
                    newly_added: detected.to_vec(),
                    created: true,
                }))
            }

            Some(mut alert) => {
                let newly_added = alert.merge(detected, reading);

                if !newly_added.is_empty() {
                    self.store.save(&alert).await?;

                    tracing::info!(
                        device_code,
                        alert_id = %alert.id(),
                        newly_added = ?newly_added,
                        "appended conditions to open alert"
                    );
                }

                Ok(Some(ReconcileOutcome {
                    alert,
                    newly_added,
                    created: false,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::InMemoryAlertStore;
    use chrono::{TimeZone, Utc};

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
            oxygen: 85.0,
            observed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn manager() -> (AlertLifecycleManager, Arc<InMemoryAlertStore>) {
        let store = Arc::new(InMemoryAlertStore::new());
        (AlertLifecycleManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_nothing_detected_no_alert() {
        let (manager, store) = manager();

        let outcome = manager.reconcile("D1", &[], &reading(0)).await.unwrap();
        assert!(outcome.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_first_detection_creates_alert() {
        let (manager, store) = manager();

        let outcome = manager
            .reconcile("D1", &[Condition::LowOxygen], &reading(0))
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.newly_added, vec![Condition::LowOxygen]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let (manager, store) = manager();

        let first = manager
            .reconcile("D1", &[Condition::LowOxygen], &reading(0))
            .await
            .unwrap()
            .unwrap();

        let replay = manager
            .reconcile("D1", &[Condition::LowOxygen], &reading(5))
            .await
            .unwrap()
            .unwrap();

        assert!(!replay.created);
        assert!(replay.is_unchanged());
        assert_eq!(replay.alert.id(), first.alert.id());
        // No second document, and the stored record kept its original reading
        assert_eq!(store.len(), 1);
        let stored = store.find_open_alert("D1").await.unwrap().unwrap();
        assert_eq!(stored.updated_at().timestamp(), 0);
    }

    #[tokio::test]
    async fn test_new_condition_appends() {
        let (manager, _store) = manager();

        manager
            .reconcile("D1", &[Condition::LowOxygen], &reading(0))
            .await
            .unwrap();

        let outcome = manager
            .reconcile("D1", &[Condition::LowOxygen, Condition::Fall], &reading(5))
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.newly_added, vec![Condition::Fall]);
        assert_eq!(
            outcome.alert.conditions(),
            &[Condition::LowOxygen, Condition::Fall]
        );
    }

    #[tokio::test]
    async fn test_detection_after_resolution_opens_fresh_alert() {
        let (manager, store) = manager();

        let first = manager
            .reconcile("D1", &[Condition::Fall], &reading(0))
            .await
            .unwrap()
            .unwrap();

        store.resolve("D1", None).await.unwrap();

        let second = manager
            .reconcile("D1", &[Condition::Fall], &reading(60))
            .await
            .unwrap()
            .unwrap();

        assert!(second.created);
        assert_ne!(second.alert.id(), first.alert.id());
        assert_eq!(store.len(), 2);
    }
}
