//! Vidya Shared Store
//!
//! Persistent key-value storage shared by the authoring and consuming
//! actors, plus the change-notification protocol that propagates writes
//! between execution contexts on the same device.

pub mod keys;
pub mod notify;
pub mod store;

pub use notify::{ChangeEvent, ChangeNotifier, ContextId, Subscription};
pub use store::{JsonFileStore, MemoryStore, SharedStore, StoreError};
