//! Domain module containing the core value objects and documents.
//!
//! - **Value objects**: immutable telemetry samples (`SensorReading`) and
//!   per-evaluation threshold sets (`Thresholds`)
//! - **Documents**: the durable `Alert` record and its outbound
//!   `AlertNotice` projection
//! - **Condition**: the closed set of emergency condition kinds

pub mod alert;
pub mod condition;
pub mod patient;
pub mod reading;

// Re-export all domain types
pub use alert::*;
pub use condition::*;
pub use patient::*;
pub use reading::*;
