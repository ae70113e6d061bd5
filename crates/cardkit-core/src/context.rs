//! Per-call context handed to app hooks.

use cardkit_platform::KvStore;
use cardkit_types::backend::{Display, Speaker};

use crate::config::RunMode;
use crate::host::Devices;
use crate::tasks::TaskQueue;

/// What an app may touch while one of its hooks runs.
///
/// Hooks never act on the framework directly: they record intent through
/// [`AppContext::request_exit`] and [`AppContext::request_redraw`], and the
/// framework acts once the hook has returned.
pub struct AppContext<'a> {
    pub display: &'a mut dyn Display,
    pub speaker: &'a mut dyn Speaker,
    pub storage: &'a mut dyn KvStore,
    pub tasks: &'a mut TaskQueue,
    now_ms: u64,
    run_mode: RunMode,
    exit_requested: bool,
    redraw_requested: bool,
}

impl<'a> AppContext<'a> {
    pub fn new(
        devices: Devices<'a>,
        tasks: &'a mut TaskQueue,
        now_ms: u64,
        run_mode: RunMode,
    ) -> Self {
        Self {
            display: devices.display,
            speaker: devices.speaker,
            storage: devices.storage,
            tasks,
            now_ms,
            run_mode,
            exit_requested: false,
            redraw_requested: false,
        }
    }

    /// Milliseconds since boot, sampled at the start of the tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Ask the framework to stop this app and return to the launcher.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Ask for `on_view` to run again before the frame is presented.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Reset the redraw flag, returning whether it was set.
    pub(crate) fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }
}
