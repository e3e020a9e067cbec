//! Alert lifecycle and outbound notification.

pub mod dispatcher;
pub mod manager;
pub mod store;

pub use dispatcher::{
    BroadcastPublisher, EmergencyDialer, LoggingDialer, NoticePublisher, NotificationDispatcher,
    PublishedNotice,
};
pub use manager::{AlertLifecycleManager, ReconcileOutcome};
pub use store::{AlertStore, InMemoryAlertStore};
