//! Registry of per-device state with idle eviction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::DeviceState;

/// Owns every device's transient state behind a per-device lock.
///
/// The outer map lock is held only to look up or insert an entry; the
/// per-device `tokio::sync::Mutex` is what serializes a whole
/// reading-to-reconciliation pass for one device, and may be held across
/// store and dispatch awaits. Readings for different devices proceed fully
/// in parallel.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Arc<Mutex<DeviceState>>>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a device's state, creating it on first contact.
    pub fn entry(&self, device_code: &str, now: DateTime<Utc>) -> Arc<Mutex<DeviceState>> {
        if let Some(entry) = self.devices.read().get(device_code) {
            return Arc::clone(entry);
        }

        let mut devices = self.devices.write();
        // Re-check: another task may have inserted between the locks
        Arc::clone(
            devices
                .entry(device_code.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(DeviceState::new(now)))),
        )
    }

    /// Number of tracked devices.
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// True when no device is tracked.
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// True if the device currently has state.
    pub fn contains(&self, device_code: &str) -> bool {
        self.devices.read().contains_key(device_code)
    }

    /// Remove devices idle longer than `staleness_secs`; returns the count.
    ///
    /// Each entry is claimed with `try_lock` before removal so the sweep
    /// never races an in-flight reconciliation holding the same device lock;
    /// a busy device is by definition not stale and is skipped.
    pub fn evict_idle(&self, now: DateTime<Utc>, staleness_secs: i64) -> usize {
        let mut devices = self.devices.write();
        let before = devices.len();

        devices.retain(|_, entry| match entry.try_lock() {
            Ok(state) => state.idle_for(now).num_seconds() < staleness_secs,
            Err(_) => true,
        });

        before - devices.len()
    }
}
