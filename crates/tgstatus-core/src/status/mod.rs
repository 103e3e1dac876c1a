//! Live status message: one message per chat, edited in place on a timer.

pub mod manager;
pub mod observer;
pub mod params;
pub mod store;

pub use manager::{ContentProvider, StatusConfig, StatusManager, UpdaterState};
pub use observer::{StatusEvent, StatusObserver, TracingObserver};
pub use params::StatusParams;
pub use store::IdentityStore;
