//! Platform service abstractions.
//!
//! The device keeps small settings in a namespaced key-value flash store.
//! [`KvStore`] is the trait apps call through; [`MemoryStore`] backs tests
//! and [`JsonFileStore`] persists to a JSON file on the desktop.

pub mod storage;

pub use storage::{JsonFileStore, KvStore, MemoryStore};
