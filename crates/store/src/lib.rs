//! Persistence for the last-known schedule and the subscriber set.

pub mod error;
pub mod factory;
pub mod json_file;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{Result, StoreError};
pub use factory::{open_stores, Stores};
pub use memory::{MemoryScheduleStore, MemorySubscriptionRegistry};
pub use traits::{ScheduleStore, SubscriptionRegistry};
