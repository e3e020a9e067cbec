//! The per-device anomaly-detection and alert-lifecycle engine.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use crate::alerting::{AlertLifecycleManager, AlertStore, NotificationDispatcher};
use crate::detection::{FallDetector, VitalSignAnalyzer};
use crate::directory::PatientDirectory;
use crate::domain::{Alert, Condition, SensorReading};
use crate::state::DeviceRegistry;
use crate::{EngineConfig, EngineError};

/// Stateful engine turning raw readings into classified, de-duplicated
/// alerts with at-most-once emergency notification per new condition.
///
/// Readings for different devices are processed fully in parallel; readings
/// for one device are serialized by its registry lock, which is held across
/// the whole detect-reconcile-dispatch pass.
pub struct Engine {
    config: EngineConfig,
    registry: DeviceRegistry,
    fall: FallDetector,
    vitals: VitalSignAnalyzer,
    manager: AlertLifecycleManager,
    dispatcher: NotificationDispatcher,
    directory: Arc<dyn PatientDirectory>,
    store: Arc<dyn AlertStore>,
}

impl Engine {
    /// Wire an engine from its configuration and collaborators.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn AlertStore>,
        directory: Arc<dyn PatientDirectory>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            fall: FallDetector::new(config.fall.clone()),
            vitals: VitalSignAnalyzer::new(config.vitals.clone()),
            manager: AlertLifecycleManager::new(store.clone()),
            registry: DeviceRegistry::new(),
            dispatcher,
            directory,
            store,
            config,
        }
    }

    /// Handle one raw transport payload.
    ///
    /// Malformed payloads are dropped with a logged error and never touch
    /// device state. Processing failures (store outages and the like) are
    /// logged and local to this message; the consumer loop keeps running.
    pub async fn handle_payload(&self, payload: &[u8]) {
        let reading = match SensorReading::decode(payload) {
            Ok(reading) => reading,
            Err(error) => {
                let error = EngineError::from(error);
                tracing::error!(%error, "dropping malformed reading");
                return;
            }
        };

        let device_code = reading.device_code.clone();
        if let Err(error) = self.process_reading(reading).await {
            tracing::warn!(%device_code, %error, "failed to process reading");
        }
    }

    /// Run the full detect-reconcile-dispatch pass for one reading.
    ///
    /// This is the per-device critical section. The device state update
    /// stands even when reconciliation fails, so the next reading retries
    /// against fresh store state.
    pub async fn process_reading(&self, reading: SensorReading) -> Result<(), EngineError> {
        let device_code = reading.device_code.clone();
        let entry = self.registry.entry(&device_code, reading.observed_at);
        let mut state = entry.lock().await;

        state.push(reading.clone(), self.config.vitals.hr_window_secs);

        let (phase, fall_confirmed) = self.fall.step(state.fall_phase(), &reading, state.history());
        state.set_fall_phase(phase);

        let age = match self.directory.age_of(&device_code).await {
            Ok(age) => age,
            Err(error) => {
                tracing::warn!(%device_code, %error, "directory lookup failed, using default age");
                None
            }
        };
        let thresholds = self.vitals.thresholds_for(age);

        let mut detected = Vec::new();
        if fall_confirmed {
            detected.push(Condition::Fall);
        }
        if self
            .vitals
            .abnormal_heart_rate(state.history(), reading.observed_at, &thresholds)
        {
            detected.push(Condition::AbnormalHeartRate);
        }
        if self
            .vitals
            .low_oxygen(state.history(), reading.observed_at, &thresholds)
        {
            detected.push(Condition::LowOxygen);
        }

        let outcome = self.manager.reconcile(&device_code, &detected, &reading).await?;

        // Persistence committed; dispatch is best-effort from here on
        if let Some(outcome) = outcome {
            self.dispatcher.dispatch(&outcome).await;
        }

        Ok(())
    }

    /// Consume payloads until the stream closes or shutdown is signalled.
    ///
    /// The idle-device eviction sweep runs on its own interval inside the
    /// loop. An in-flight reading always finishes before the loop exits, so
    /// shutdown never abandons a half-updated alert.
    pub async fn run(
        self: Arc<Self>,
        mut payloads: mpsc::Receiver<Vec<u8>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut sweep = tokio::time::interval(std::time::Duration::from_secs(
            self.config.eviction_interval_secs,
        ));
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!("engine consumer loop started");

        loop {
            tokio::select! {
                payload = payloads.recv() => match payload {
                    Some(payload) => self.handle_payload(&payload).await,
                    None => break,
                },
                _ = sweep.tick() => {
                    let evicted = self
                        .registry
                        .evict_idle(Utc::now(), self.config.staleness_secs as i64);
                    if evicted > 0 {
                        tracing::debug!(evicted, "evicted idle device state");
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                },
            }
        }

        tracing::info!("engine consumer loop stopped");
    }

    /// Resolve the device's open alert; see [`AlertStore::resolve`].
    pub async fn resolve_alert(
        &self,
        device_code: &str,
        condition: Option<Condition>,
    ) -> Result<bool, EngineError> {
        let resolved = self.store.resolve(device_code, condition).await?;
        if resolved {
            tracing::info!(device_code, ?condition, "alert resolved");
        }
        Ok(resolved)
    }

    /// All unresolved alerts, most recently updated first.
    pub async fn pending_alerts(&self) -> Result<Vec<Alert>, EngineError> {
        self.store.pending_alerts().await
    }

    /// Number of devices currently holding state.
    pub fn tracked_devices(&self) -> usize {
        self.registry.len()
    }

    /// Run one eviction sweep immediately; returns the eviction count.
    pub fn sweep_now(&self, now: chrono::DateTime<Utc>) -> usize {
        self.registry.evict_idle(now, self.config.staleness_secs as i64)
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
