//! The fixed-tick main loop.
//!
//! [`Framework`] owns the host, the loader, the launcher and the active app
//! slot. Each [`Framework::tick`]:
//!
//! 1. polls the host
//! 2. drains every queued key and dispatches them in order to the active app
//!    or the launcher, dropping the rest of the batch once a transition is
//!    pending
//! 3. applies the pending transition (launch, return, reload)
//! 4. fires due timers, then `on_tick`
//! 5. expires the launcher status message and redraws the launcher if needed
//! 6. presents the frame
//! 7. sleeps for what is left of the tick budget

use cardkit_types::error::Result;
use cardkit_types::input::{Key, KeyEvent};
use cardkit_vfs::Vfs;

use crate::catalog::AppCatalog;
use crate::config::{FrameworkConfig, RunMode};
use crate::context::AppContext;
use crate::host::Host;
use crate::launcher::{Launcher, LauncherAction};
use crate::loader::AppLoader;
use crate::tasks::TaskQueue;

/// What currently owns the screen and the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Active {
    Launcher,
    /// A running app, by module path.
    App(String),
}

/// A change of active slot recorded during a tick and applied after the
/// handlers that asked for it have returned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    Launch(String),
    ToLauncher,
    Reload,
}

pub struct Framework<H: Host> {
    host: H,
    config: FrameworkConfig,
    loader: AppLoader,
    launcher: Launcher,
    tasks: TaskQueue,
    active: Active,
    booted: bool,
}

impl<H: Host> Framework<H> {
    /// Resolve the run mode and apps root from `config` and `vfs`.
    pub fn new(host: H, vfs: Box<dyn Vfs>, catalog: AppCatalog, config: FrameworkConfig) -> Self {
        let run_mode = config.resolve_run_mode(vfs.as_ref());
        let apps_root = config.resolve_apps_root(run_mode);
        let loader = AppLoader::new(
            vfs,
            catalog,
            apps_root,
            config.launcher_module.clone(),
            run_mode,
        );
        let launcher = Launcher::new(&config, run_mode);
        Self {
            host,
            config,
            loader,
            launcher,
            tasks: TaskQueue::new(),
            active: Active::Launcher,
            booted: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn loader(&self) -> &AppLoader {
        &self.loader
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    pub fn active(&self) -> &Active {
        &self.active
    }

    pub fn run_mode(&self) -> RunMode {
        self.loader.run_mode()
    }

    /// Scan the apps tree and show the launcher. Called by the first
    /// [`Framework::tick`] if not called explicitly.
    pub fn boot(&mut self) -> Result<()> {
        if self.booted {
            return Ok(());
        }
        log::info!(
            "[framework] starting in {} mode, apps at {}",
            self.run_mode().label(),
            self.loader.apps_root()
        );
        self.loader.registry();
        self.active = Active::Launcher;
        self.launcher.reset();
        self.draw_launcher()?;
        self.host.devices().display.present()?;
        self.booted = true;
        Ok(())
    }

    /// Run one iteration of the main loop.
    ///
    /// Load and start failures are shown on the launcher and do not fail the
    /// tick. Errors from a running app's hooks are returned.
    pub fn tick(&mut self) -> Result<()> {
        self.boot()?;
        let started = self.host.now_ms();
        self.host.update()?;
        let now = self.host.now_ms();
        self.tasks.set_now(now);

        let mut batch = Vec::new();
        while let Some(event) = self.host.poll_key() {
            batch.push(event);
        }
        let mut pending = None;
        for mut event in batch {
            if pending.is_some() {
                log::debug!("[framework] dropped {} after transition", event.key);
                continue;
            }
            pending = self.dispatch_key(&mut event, now)?;
        }
        if let Some(transition) = pending {
            self.apply(transition, now)?;
        }

        if let Active::App(path) = &self.active {
            let path = path.clone();
            if let Some(transition) = self.tick_app(&path, now)? {
                self.apply(transition, now)?;
            }
        }

        self.launcher.tick(now);
        if self.active == Active::Launcher && self.launcher.needs_redraw() {
            self.draw_launcher()?;
        }
        self.host.devices().display.present()?;

        let elapsed = self.host.now_ms().saturating_sub(started);
        if elapsed < self.config.tick_ms {
            self.host.sleep_ms(self.config.tick_ms - elapsed);
        }
        Ok(())
    }

    /// Tick until the host asks to quit, then stop the active app.
    pub fn run(&mut self) -> Result<()> {
        self.boot()?;
        while !self.host.should_quit() {
            self.tick()?;
        }
        self.shutdown()
    }

    /// Stop the active app, if any, and fall back to the launcher.
    pub fn shutdown(&mut self) -> Result<()> {
        let now = self.host.now_ms();
        self.return_to_launcher(now)?;
        log::info!("[framework] stopped");
        Ok(())
    }

    fn dispatch_key(&mut self, event: &mut KeyEvent, now: u64) -> Result<Option<Transition>> {
        let path = match &self.active {
            Active::Launcher => {
                let registry = self.loader.registry();
                return Ok(match self.launcher.handle_key(event, registry) {
                    LauncherAction::None => None,
                    LauncherAction::Launch(path) => Some(Transition::Launch(path)),
                    LauncherAction::Reload => Some(Transition::Reload),
                });
            },
            Active::App(path) => path.clone(),
        };

        let run_mode = self.loader.run_mode();
        let Some(slot) = self.loader.instance_mut(&path) else {
            log::warn!("[framework] active app {path} missing from cache");
            return Ok(Some(Transition::ToLauncher));
        };
        let mut ctx = AppContext::new(self.host.devices(), &mut self.tasks, now, run_mode);
        slot.app_mut().handle_key(event, &mut ctx)?;
        if ctx.take_redraw() {
            slot.app_mut().on_view(&mut ctx)?;
        }
        let leave = ctx.exit_requested() || (!event.is_handled() && event.key == Key::Escape);
        Ok(leave.then_some(Transition::ToLauncher))
    }

    fn tick_app(&mut self, path: &str, now: u64) -> Result<Option<Transition>> {
        let due = self.tasks.take_due(now);
        let run_mode = self.loader.run_mode();
        let Some(slot) = self.loader.instance_mut(path) else {
            return Ok(None);
        };
        let mut ctx = AppContext::new(self.host.devices(), &mut self.tasks, now, run_mode);
        for id in due {
            slot.app_mut().on_timer(id, &mut ctx)?;
            if ctx.exit_requested() {
                break;
            }
        }
        if !ctx.exit_requested() {
            slot.app_mut().on_tick(&mut ctx)?;
        }
        if ctx.take_redraw() {
            slot.app_mut().on_view(&mut ctx)?;
        }
        Ok(ctx.exit_requested().then_some(Transition::ToLauncher))
    }

    fn apply(&mut self, transition: Transition, now: u64) -> Result<()> {
        match transition {
            Transition::Launch(path) => self.launch(&path, now),
            Transition::ToLauncher => self.return_to_launcher(now),
            Transition::Reload => self.reload(now),
        }
    }

    fn launch(&mut self, path: &str, now: u64) -> Result<()> {
        self.return_to_launcher(now)?;
        let run_mode = self.loader.run_mode();
        let slot = match self.loader.get_or_load(path) {
            Ok(slot) => slot,
            Err(e) => {
                log::warn!("[framework] {e}");
                self.launcher.show_status(e.to_string(), now);
                return Ok(());
            },
        };

        let mut ctx = AppContext::new(self.host.devices(), &mut self.tasks, now, run_mode);
        match slot.start(&mut ctx) {
            Ok(()) => {
                log::info!("[framework] launched {} ({path})", slot.app().name());
                self.active = Active::App(path.to_string());
            },
            Err(e) => {
                log::warn!("[framework] starting {path} failed: {e}");
                if let Err(stop_err) = slot.stop(&mut ctx) {
                    log::warn!("[framework] stopping {path} failed: {stop_err}");
                }
                self.tasks.clear();
                self.launcher.show_status(format!("{path}: {e}"), now);
            },
        }
        Ok(())
    }

    fn return_to_launcher(&mut self, now: u64) -> Result<()> {
        let Active::App(path) = std::mem::replace(&mut self.active, Active::Launcher) else {
            return Ok(());
        };
        log::info!("[framework] returning to launcher from {path}");
        let run_mode = self.loader.run_mode();
        let result = match self.loader.instance_mut(&path) {
            Some(slot) => {
                let mut ctx =
                    AppContext::new(self.host.devices(), &mut self.tasks, now, run_mode);
                slot.stop(&mut ctx)
            },
            None => Ok(()),
        };
        self.tasks.clear();
        self.launcher.invalidate();
        result
    }

    fn reload(&mut self, now: u64) -> Result<()> {
        self.return_to_launcher(now)?;
        let run_mode = self.loader.run_mode();
        let mut ctx = AppContext::new(self.host.devices(), &mut self.tasks, now, run_mode);
        if self.loader.clear_cache(&mut ctx) {
            self.tasks.clear();
            self.loader.registry();
            self.launcher.reset();
            self.launcher.show_status("Reloaded", now);
        } else {
            self.launcher.show_status("Reload needs remote mode", now);
        }
        Ok(())
    }

    fn draw_launcher(&mut self) -> Result<()> {
        let registry = self.loader.registry();
        let devices = self.host.devices();
        self.launcher.view(devices.display, registry)
    }
}

impl<H: Host> std::fmt::Debug for Framework<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("active", &self.active)
            .field("loader", &self.loader)
            .field("booted", &self.booted)
            .finish()
    }
}
