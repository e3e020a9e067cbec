//! # Bandguard
//!
//! Per-device anomaly-detection and alert-lifecycle engine for wearable
//! telemetry. The engine consumes a stream of raw sensor readings
//! (acceleration, gyroscope, heart rate, blood-oxygen saturation), decides
//! per device whether an emergency condition is occurring, merges detections
//! into a de-duplicated alert record, and triggers exactly one external
//! emergency notification per newly detected condition.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        bandguard                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │  Device   │   │  Detection  │   │     Alerting     │  │
//! │  │  State    │──▶│ fall/vitals │──▶│ reconcile +      │  │
//! │  │  Store    │   │             │   │ dispatch         │  │
//! │  └───────────┘   └─────────────┘   └────────┬─────────┘  │
//! │                                             │            │
//! │     collaborators: alert store, transport publisher,     │
//! │          emergency dialer, patient directory             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport delivery, durable storage, and the emergency call itself are
//! external collaborators behind traits; in-memory implementations ship with
//! the crate for wiring and tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bandguard::{
//!     BroadcastPublisher, Engine, EngineConfig, InMemoryAlertStore,
//!     LoggingDialer, NotificationDispatcher, StaticDirectory,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EngineConfig::builder()
//!         .emergency_contact("+15550100000")
//!         .build();
//!
//!     let publisher = Arc::new(BroadcastPublisher::new(64));
//!     let dispatcher = NotificationDispatcher::new(
//!         publisher.clone(),
//!         Arc::new(LoggingDialer),
//!         config.emergency_contact.clone(),
//!     );
//!
//!     let engine = Engine::new(
//!         config,
//!         Arc::new(InMemoryAlertStore::new()),
//!         Arc::new(StaticDirectory::new()),
//!         dispatcher,
//!     );
//!
//!     engine.handle_payload(br#"{
//!         "device_code": "D1",
//!         "accelX": 0.1, "accelY": 0.2, "accelZ": 9.8,
//!         "gyroX": 0.0, "gyroY": 0.0, "gyroZ": 0.0,
//!         "heartRate": 72.0, "oxygen": 97.0
//!     }"#).await;
//! }
//! ```

#![warn(missing_docs)]

pub mod alerting;
pub mod detection;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod state;

// Re-export main types
pub use alerting::{
    AlertLifecycleManager, AlertStore, BroadcastPublisher, EmergencyDialer, InMemoryAlertStore,
    LoggingDialer, NoticePublisher, NotificationDispatcher, PublishedNotice, ReconcileOutcome,
};
pub use detection::{FallConfig, FallDetector, FallPhase, VitalSignAnalyzer, VitalsConfig};
pub use directory::{PatientDirectory, StaticDirectory};
pub use domain::{Alert, AlertId, AlertNotice, Condition, SensorReading, Thresholds};
pub use engine::Engine;
pub use state::{DeviceRegistry, DeviceState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Unparsable or incomplete inbound reading
    #[error("malformed reading: {0}")]
    Decode(#[from] serde_json::Error),

    /// Durable alert store failure
    #[error("alert store error: {0}")]
    Store(String),

    /// Transport publish failure
    #[error("notice publish error: {0}")]
    Publish(String),

    /// Emergency call dispatch failure
    #[error("emergency dispatch error: {0}")]
    Dispatch(String),

    /// Patient directory failure
    #[error("patient directory error: {0}")]
    Directory(String),
}

/// Configuration for the engine.
///
/// Detector thresholds live in the nested [`FallConfig`] and [`VitalsConfig`];
/// the fields here govern device-state retention and the emergency contact.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fall detector configuration.
    pub fall: FallConfig,
    /// Vital-sign analyzer configuration.
    pub vitals: VitalsConfig,
    /// Interval between idle-device eviction sweeps (default 30 s).
    pub eviction_interval_secs: u64,
    /// Idle duration after which device state is evicted (default 60 s).
    pub staleness_secs: u64,
    /// Phone number handed to the emergency dialer.
    pub emergency_contact: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fall: FallConfig::default(),
            vitals: VitalsConfig::default(),
            eviction_interval_secs: 30,
            staleness_secs: 60,
            emergency_contact: String::new(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the fall detector configuration.
    pub fn fall(mut self, fall: FallConfig) -> Self {
        self.config.fall = fall;
        self
    }

    /// Set the vital-sign analyzer configuration.
    pub fn vitals(mut self, vitals: VitalsConfig) -> Self {
        self.config.vitals = vitals;
        self
    }

    /// Set the eviction sweep interval.
    pub fn eviction_interval_secs(mut self, secs: u64) -> Self {
        self.config.eviction_interval_secs = secs.max(1);
        self
    }

    /// Set the idle-eviction threshold.
    pub fn staleness_secs(mut self, secs: u64) -> Self {
        self.config.staleness_secs = secs.max(1);
        self
    }

    /// Set the emergency contact number.
    pub fn emergency_contact(mut self, contact: impl Into<String>) -> Self {
        self.config.emergency_contact = contact.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
