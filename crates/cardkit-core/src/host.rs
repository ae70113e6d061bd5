//! The boundary between the framework and the device runtime.

use cardkit_platform::KvStore;
use cardkit_types::backend::{Display, Speaker};
use cardkit_types::error::Result;
use cardkit_types::input::KeyEvent;

/// Split mutable access to the host's devices.
pub struct Devices<'a> {
    pub display: &'a mut dyn Display,
    pub speaker: &'a mut dyn Speaker,
    pub storage: &'a mut dyn KvStore,
}

/// A device runtime the framework can drive.
///
/// Implemented by the device firmware glue, the desktop runner's terminal
/// host, and [`MockHost`](crate::testing::MockHost) in tests.
pub trait Host {
    /// Poll hardware. Called once at the top of every tick, before keys are
    /// drained.
    fn update(&mut self) -> Result<()>;

    /// Next buffered key press, if any. Must not block.
    fn poll_key(&mut self) -> Option<KeyEvent>;

    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Yield for the rest of the tick.
    fn sleep_ms(&mut self, ms: u64);

    fn devices(&mut self) -> Devices<'_>;

    /// Whether [`Framework::run`](crate::framework::Framework::run) should
    /// return. Device hosts never quit.
    fn should_quit(&self) -> bool {
        false
    }
}
