//! Transient per-device engine state.

pub mod device;
pub mod registry;

pub use device::DeviceState;
pub use registry::DeviceRegistry;
