//! cardkit core framework.
//!
//! Platform-agnostic pieces of the handheld app framework: the [`App`]
//! lifecycle trait, manifest-driven app discovery, the lazy loader and its
//! instance cache, the launcher menu, cooperative timers, and the fixed-tick
//! [`Framework`] loop that ties them to a [`Host`].

pub mod app;
pub mod catalog;
pub mod config;
pub mod context;
pub mod framework;
pub mod host;
pub mod launcher;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod tasks;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export foundation crates so apps depend on one crate.
pub use cardkit_platform as platform;
pub use cardkit_types::backend::{self, BufferId, Color, Display, Speaker};
pub use cardkit_types::error::{self, CardkitError, Result};
pub use cardkit_types::input::{self, Key, KeyEvent, Modifiers};
pub use cardkit_vfs as vfs;

pub use app::App;
pub use catalog::AppCatalog;
pub use config::{FrameworkConfig, RunMode};
pub use context::AppContext;
pub use framework::{Active, Framework};
pub use host::{Devices, Host};
pub use launcher::{Launcher, LauncherAction};
pub use lifecycle::LifecycleState;
pub use loader::AppLoader;
pub use registry::{AppDescriptor, AppKind, MenuNode, Registry};
pub use tasks::{TaskQueue, TimerId};
