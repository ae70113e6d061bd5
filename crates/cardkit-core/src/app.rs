//! The application trait.

use cardkit_types::error::Result;
use cardkit_types::input::KeyEvent;

use crate::context::AppContext;
use crate::tasks::TimerId;

/// A launchable application.
///
/// Only [`App::name`] and [`App::on_view`] are required. The framework calls
/// the hooks in this order:
///
/// - `on_install` once, when the instance is constructed and cached
/// - `on_launch`, `on_view`, `on_ready` on every activation
/// - `on_tick`, `on_timer`, `handle_key` while active
/// - `on_hide`, `on_exit` on every deactivation
/// - `on_uninstall` once, when the cached instance is evicted
///
/// Instances are reused across activations, so anything kept in `self`
/// survives a trip back to the launcher.
pub trait App {
    /// Human-readable name, used in log messages.
    fn name(&self) -> &str;

    fn on_install(&mut self) -> Result<()> {
        Ok(())
    }

    /// About to become active. Reset per-session state here.
    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Draw the full UI. Also called again whenever a hook requests a
    /// redraw.
    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()>;

    /// Visible and about to receive ticks. Schedule timers here.
    fn on_ready(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once per framework tick while active.
    fn on_tick(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// A timer scheduled through [`AppContext::tasks`] came due.
    fn on_timer(&mut self, _id: TimerId, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Handle one key press. Call [`KeyEvent::mark_handled`] to consume it;
    /// an unhandled Escape returns to the launcher.
    fn handle_key(&mut self, _event: &mut KeyEvent, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Losing the screen. Pending timers are cancelled by the framework
    /// after this returns.
    fn on_hide(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Fully stopped. Release display buffers and other resources here.
    fn on_exit(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_uninstall(&mut self) -> Result<()> {
        Ok(())
    }
}
