//! Durable alert store collaborator.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{Alert, Condition};
use crate::EngineError;

/// Document store for alert records, keyed by device.
///
/// The engine treats the store as an external collaborator: reads and writes
/// may fail or time out, and a failure aborts reconciliation for the current
/// message without corrupting in-memory device state.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Find the device's unresolved alert, if any.
    async fn find_open_alert(&self, device_code: &str) -> Result<Option<Alert>, EngineError>;

    /// Persist a new or updated alert.
    async fn save(&self, alert: &Alert) -> Result<(), EngineError>;

    /// Resolve the most recent unresolved alert for the device, optionally
    /// filtered to alerts recording the given condition. Returns whether a
    /// record was updated.
    async fn resolve(
        &self,
        device_code: &str,
        condition: Option<Condition>,
    ) -> Result<bool, EngineError>;

    /// All unresolved alerts, most recently updated first.
    async fn pending_alerts(&self) -> Result<Vec<Alert>, EngineError>;
}

/// In-memory alert store used by the binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryAlertStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored alerts, resolved included.
    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn find_open_alert(&self, device_code: &str) -> Result<Option<Alert>, EngineError> {
        Ok(self
            .alerts
            .read()
            .iter()
            .find(|a| a.device_code() == device_code && !a.is_resolved())
            .cloned())
    }

    async fn save(&self, alert: &Alert) -> Result<(), EngineError> {
        let mut alerts = self.alerts.write();
        match alerts.iter_mut().find(|a| a.id() == alert.id()) {
            Some(existing) => *existing = alert.clone(),
            None => alerts.push(alert.clone()),
        }
        Ok(())
    }

    async fn resolve(
        &self,
        device_code: &str,
        condition: Option<Condition>,
    ) -> Result<bool, EngineError> {
        let mut alerts = self.alerts.write();

        let target = alerts
            .iter_mut()
            .filter(|a| a.device_code() == device_code && !a.is_resolved())
            .filter(|a| condition.map_or(true, |c| a.records(c)))
            .max_by_key(|a| a.updated_at());

        match target {
            Some(alert) => {
                alert.resolve();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pending_alerts(&self) -> Result<Vec<Alert>, EngineError> {
        let mut pending: Vec<Alert> = self
            .alerts
            .read()
            .iter()
            .filter(|a| !a.is_resolved())
            .cloned()
            .collect();
        pending.sort_by_key(|a| std::cmp::Reverse(a.updated_at()));
        Ok(pending)
    }
}
