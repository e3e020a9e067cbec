//! Patient directory collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::EngineError;

/// Supplies per-patient attributes used to personalize thresholds.
///
/// A lookup failure never blocks detection; the engine falls back to the
/// configured default age.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Age of the patient wearing the device, if known.
    async fn age_of(&self, device_code: &str) -> Result<Option<u8>, EngineError>;
}

/// In-memory directory used by the binary and tests.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    ages: RwLock<HashMap<String, u8>>,
}

impl StaticDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a patient's age for a device.
    pub fn insert(&self, device_code: impl Into<String>, age: u8) {
        self.ages.write().insert(device_code.into(), age);
    }
}

#[async_trait]
impl PatientDirectory for StaticDirectory {
    async fn age_of(&self, device_code: &str) -> Result<Option<u8>, EngineError> {
        Ok(self.ages.read().get(device_code).copied())
    }
}
