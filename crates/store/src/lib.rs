//! `daybook-store` — durable key-value storage and cross-context change
//! notifications.
//!
//! The rest of the application persists everything through the [`KvStore`]
//! trait: a flat string-to-string map scoped to the client device. Production
//! backs it with platform storage; tests use [`MemoryKv`]. [`SharedStore`]
//! models several live contexts (tabs/processes) sharing one durable map,
//! each observing the others' writes through a payload-less [`StoreChange`]
//! notification.

pub mod bus;
pub mod kv;
pub mod shared;

pub use bus::{StoreChange, Subscription};
pub use kv::{KvStore, MemoryKv, StoreError};
pub use shared::{ContextStore, SharedStore};
