//! Detectors that turn the rolling sensor window into condition signals.

pub mod fall;
pub mod vitals;

pub use fall::{FallConfig, FallDetector, FallPhase, STANDARD_GRAVITY};
pub use vitals::{VitalSignAnalyzer, VitalsConfig};
