//! Lifecycle bookkeeping for one cached app instance.

use std::fmt;

use cardkit_types::error::{CardkitError, Result};

use crate::app::App;
use crate::context::AppContext;

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed and installed, never started.
    Installed,
    /// `on_launch` has run.
    Launched,
    /// `on_view` has run. `on_ready` runs next, or has run.
    Visible,
    /// `on_hide` has run.
    Hidden,
    /// `on_exit` has run. The instance may be started again.
    Exited,
}

impl LifecycleState {
    /// Between a start and the matching stop.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Launched | Self::Visible | Self::Hidden)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Installed => "installed",
            Self::Launched => "launched",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Exited => "exited",
        };
        f.write_str(s)
    }
}

/// A cached app instance and the state its hooks have reached.
///
/// All hook sequencing goes through here so the ordering rules live in one
/// place. If a hook fails the state stays at the last hook that succeeded.
pub struct AppSlot {
    app: Box<dyn App>,
    state: LifecycleState,
}

impl AppSlot {
    /// Run `on_install` and wrap the instance.
    pub fn install(mut app: Box<dyn App>) -> Result<Self> {
        app.on_install()?;
        Ok(Self {
            app,
            state: LifecycleState::Installed,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn app(&self) -> &dyn App {
        self.app.as_ref()
    }

    pub fn app_mut(&mut self) -> &mut dyn App {
        self.app.as_mut()
    }

    /// `on_launch`, `on_view`, `on_ready`.
    pub fn start(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        if self.state.is_active() {
            return Err(CardkitError::Lifecycle(format!(
                "{} is already {}",
                self.app.name(),
                self.state
            )));
        }
        self.app.on_launch(ctx)?;
        self.state = LifecycleState::Launched;
        self.app.on_view(ctx)?;
        self.state = LifecycleState::Visible;
        self.app.on_ready(ctx)
    }

    /// `on_hide` (unless already hidden), then `on_exit`. A no-op for an
    /// instance that is not active.
    pub fn stop(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        if !self.state.is_active() {
            return Ok(());
        }
        if self.state != LifecycleState::Hidden {
            self.app.on_hide(ctx)?;
            self.state = LifecycleState::Hidden;
        }
        self.app.on_exit(ctx)?;
        self.state = LifecycleState::Exited;
        Ok(())
    }

    /// Run `on_uninstall`, consuming the slot. Stop it first if active.
    pub fn uninstall(mut self) -> Result<()> {
        self.app.on_uninstall()
    }
}

impl fmt::Debug for AppSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSlot")
            .field("app", &self.app.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskQueue;
    use crate::testing::{HookLog, MockHost, ProbeApp};

    fn slot(log: &HookLog) -> AppSlot {
        AppSlot::install(Box::new(ProbeApp::new("probe", log.clone()))).unwrap()
    }

    #[test]
    fn install_runs_on_install_only() {
        let log = HookLog::default();
        let s = slot(&log);
        assert_eq!(s.state(), LifecycleState::Installed);
        assert_eq!(log.take(), vec!["probe:install"]);
    }

    #[test]
    fn start_then_stop_hook_order() {
        let log = HookLog::default();
        let mut s = slot(&log);
        log.take();
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);

        s.start(&mut ctx).unwrap();
        assert_eq!(s.state(), LifecycleState::Visible);
        assert!(s.is_active());
        s.stop(&mut ctx).unwrap();
        assert_eq!(s.state(), LifecycleState::Exited);
        assert_eq!(
            log.take(),
            vec![
                "probe:launch",
                "probe:view",
                "probe:ready",
                "probe:hide",
                "probe:exit"
            ]
        );
    }

    #[test]
    fn restart_after_exit() {
        let log = HookLog::default();
        let mut s = slot(&log);
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        s.start(&mut ctx).unwrap();
        s.stop(&mut ctx).unwrap();
        log.take();
        s.start(&mut ctx).unwrap();
        assert_eq!(log.take(), vec!["probe:launch", "probe:view", "probe:ready"]);
    }

    #[test]
    fn double_start_is_rejected() {
        let log = HookLog::default();
        let mut s = slot(&log);
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        s.start(&mut ctx).unwrap();
        assert!(matches!(
            s.start(&mut ctx),
            Err(CardkitError::Lifecycle(_))
        ));
    }

    #[test]
    fn stop_when_inactive_is_noop() {
        let log = HookLog::default();
        let mut s = slot(&log);
        log.take();
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        s.stop(&mut ctx).unwrap();
        assert!(log.take().is_empty());
        assert_eq!(s.state(), LifecycleState::Installed);
    }

    #[test]
    fn stop_retry_after_failed_exit_skips_second_hide() {
        let log = HookLog::default();
        let mut s = AppSlot::install(Box::new(
            ProbeApp::new("closer", log.clone()).failing_on("exit"),
        ))
        .unwrap();
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        s.start(&mut ctx).unwrap();
        log.take();

        assert!(s.stop(&mut ctx).is_err());
        assert_eq!(s.state(), LifecycleState::Hidden);
        assert_eq!(log.take(), vec!["closer:hide", "closer:exit"]);

        assert!(s.stop(&mut ctx).is_err());
        assert_eq!(log.take(), vec!["closer:exit"]);
    }

    #[test]
    fn failing_hook_leaves_last_good_state() {
        let log = HookLog::default();
        let mut s = AppSlot::install(Box::new(
            ProbeApp::new("probe", log.clone()).failing_on("view"),
        ))
        .unwrap();
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        assert!(s.start(&mut ctx).is_err());
        assert_eq!(s.state(), LifecycleState::Launched);
        // Still active, so stop runs the teardown hooks.
        s.stop(&mut ctx).unwrap();
        assert_eq!(s.state(), LifecycleState::Exited);
    }

    #[test]
    fn failing_install_is_an_error() {
        let log = HookLog::default();
        let app = ProbeApp::new("probe", log.clone()).failing_on("install");
        assert!(AppSlot::install(Box::new(app)).is_err());
    }

    #[test]
    fn uninstall_runs_hook() {
        let log = HookLog::default();
        let s = slot(&log);
        log.take();
        s.uninstall().unwrap();
        assert_eq!(log.take(), vec!["probe:uninstall"]);
    }
}
