//! Lazy app loading and the instance cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use cardkit_types::error::Result;
use cardkit_vfs::Vfs;

use crate::catalog::AppCatalog;
use crate::config::RunMode;
use crate::context::AppContext;
use crate::lifecycle::AppSlot;
use crate::registry::Registry;

/// Owns everything discovered or constructed from the apps tree: the VFS,
/// the module catalog, the scanned registry and the cached instances.
///
/// At most one instance exists per module path. Instances are created on
/// first request and only ever evicted all at once by
/// [`AppLoader::clear_cache`].
pub struct AppLoader {
    vfs: Box<dyn Vfs>,
    catalog: AppCatalog,
    apps_root: String,
    launcher_module: String,
    run_mode: RunMode,
    registry: Option<Registry>,
    scans: u64,
    instances: HashMap<String, AppSlot>,
}

impl AppLoader {
    pub fn new(
        vfs: Box<dyn Vfs>,
        catalog: AppCatalog,
        apps_root: impl Into<String>,
        launcher_module: impl Into<String>,
        run_mode: RunMode,
    ) -> Self {
        Self {
            vfs,
            catalog,
            apps_root: apps_root.into(),
            launcher_module: launcher_module.into(),
            run_mode,
            registry: None,
            scans: 0,
            instances: HashMap::new(),
        }
    }

    pub fn apps_root(&self) -> &str {
        &self.apps_root
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn vfs(&self) -> &dyn Vfs {
        self.vfs.as_ref()
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// The registry, scanning the apps tree first if needed.
    pub fn registry(&mut self) -> &Registry {
        if self.registry.is_none() {
            let mut registry =
                Registry::scan(self.vfs.as_ref(), &self.apps_root, &self.launcher_module);
            registry.set_generation(self.scans);
            self.scans += 1;
            self.registry = Some(registry);
        }
        self.registry.get_or_insert_default()
    }

    /// The registry if it has been scanned.
    pub fn cached_registry(&self) -> Option<&Registry> {
        self.registry.as_ref()
    }

    /// Number of scans performed so far.
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    /// The cached instance for `module_path`, constructing and installing
    /// it on first use.
    ///
    /// On failure nothing is cached and no other entry is touched, so a
    /// later call retries from scratch.
    pub fn get_or_load(&mut self, module_path: &str) -> Result<&mut AppSlot> {
        match self.instances.entry(module_path.to_string()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(vacant) => {
                log::info!("[load] loading {module_path}");
                let app = self.catalog.import(module_path)?;
                let slot = AppSlot::install(app)?;
                log::info!("[load] loaded {} ({module_path})", slot.app().name());
                Ok(vacant.insert(slot))
            },
        }
    }

    pub fn is_loaded(&self, module_path: &str) -> bool {
        self.instances.contains_key(module_path)
    }

    pub fn loaded_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instance(&self, module_path: &str) -> Option<&AppSlot> {
        self.instances.get(module_path)
    }

    pub fn instance_mut(&mut self, module_path: &str) -> Option<&mut AppSlot> {
        self.instances.get_mut(module_path)
    }

    /// Evict every instance and forget the registry so the next access
    /// rescans. Development mode only; in flash mode this logs a warning and
    /// returns `false`.
    ///
    /// Active instances are stopped first. Hook errors during eviction are
    /// logged and do not stop the sweep.
    pub fn clear_cache(&mut self, ctx: &mut AppContext<'_>) -> bool {
        if !self.run_mode.is_dev() {
            log::warn!("[reload] ignored: reload is only available in remote mode");
            return false;
        }

        let mut paths: Vec<String> = self.instances.keys().cloned().collect();
        paths.sort_unstable();
        for path in paths {
            let Some(mut slot) = self.instances.remove(&path) else {
                continue;
            };
            if let Err(e) = slot.stop(ctx) {
                log::warn!("[reload] stopping {path}: {e}");
            }
            if let Err(e) = slot.uninstall() {
                log::warn!("[reload] uninstalling {path}: {e}");
            }
            log::debug!("[reload] evicted {path}");
        }
        self.registry = None;
        log::info!("[reload] cleared app cache");
        true
    }
}

impl std::fmt::Debug for AppLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppLoader")
            .field("apps_root", &self.apps_root)
            .field("run_mode", &self.run_mode)
            .field("scans", &self.scans)
            .field("loaded", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::app::App;
    use crate::lifecycle::LifecycleState;
    use crate::tasks::TaskQueue;
    use crate::testing::{HookLog, MockHost, ProbeApp};
    use cardkit_types::error::CardkitError;
    use cardkit_vfs::MemoryVfs;

    struct Fixture {
        loader: AppLoader,
        log: HookLog,
        imports: Rc<Cell<u32>>,
    }

    fn fixture(mode: RunMode) -> Fixture {
        let mut vfs = MemoryVfs::new();
        vfs.put("/apps/manifest.json", r#"{"a": "A App", "b": "B App"}"#)
            .unwrap();

        let log = HookLog::default();
        let imports = Rc::new(Cell::new(0));
        let mut catalog = AppCatalog::new();
        for name in ["a", "b"] {
            let log = log.clone();
            let imports = Rc::clone(&imports);
            catalog.register(name, move || {
                imports.set(imports.get() + 1);
                Ok(Box::new(ProbeApp::new(name, log.clone())) as Box<dyn App>)
            });
        }
        catalog.register("broken", || Err(CardkitError::Backend("boom".into())));

        Fixture {
            loader: AppLoader::new(Box::new(vfs), catalog, "/apps", "launcher", mode),
            log,
            imports,
        }
    }

    fn slot_addr(slot: &AppSlot) -> *const () {
        slot.app() as *const dyn App as *const ()
    }

    #[test]
    fn registry_is_scanned_lazily_once() {
        let mut f = fixture(RunMode::Remote);
        assert!(f.loader.cached_registry().is_none());
        assert_eq!(f.loader.scan_count(), 0);
        assert_eq!(f.loader.registry().entries("").len(), 2);
        f.loader.registry();
        assert_eq!(f.loader.scan_count(), 1);
        // Scanning constructs nothing.
        assert_eq!(f.imports.get(), 0);
    }

    #[test]
    fn repeated_load_returns_same_instance() {
        let mut f = fixture(RunMode::Flash);
        let first = slot_addr(f.loader.get_or_load("a").unwrap());
        let second = slot_addr(f.loader.get_or_load("a").unwrap());
        assert_eq!(first, second);
        assert_eq!(f.imports.get(), 1);
        assert_eq!(f.log.count("a:install"), 1);
    }

    #[test]
    fn failed_load_leaves_cache_intact() {
        let mut f = fixture(RunMode::Flash);
        let a = slot_addr(f.loader.get_or_load("a").unwrap());

        let err = f.loader.get_or_load("broken").unwrap_err();
        assert!(matches!(err, CardkitError::Load { .. }));
        assert!(f.loader.get_or_load("missing").is_err());

        assert!(!f.loader.is_loaded("broken"));
        assert_eq!(f.loader.loaded_count(), 1);
        assert_eq!(slot_addr(f.loader.get_or_load("a").unwrap()), a);
    }

    #[test]
    fn failed_install_is_not_cached() {
        let mut f = fixture(RunMode::Flash);
        let log = f.log.clone();
        let mut catalog = AppCatalog::new();
        catalog.register("flaky", move || {
            Ok(Box::new(ProbeApp::new("flaky", log.clone()).failing_on("install")) as Box<dyn App>)
        });
        f.loader.catalog = catalog;
        assert!(f.loader.get_or_load("flaky").is_err());
        assert!(!f.loader.is_loaded("flaky"));
    }

    #[test]
    fn reload_reimports_exactly_once_more() {
        let mut f = fixture(RunMode::Remote);
        f.loader.get_or_load("a").unwrap();
        assert_eq!(f.imports.get(), 1);

        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        assert!(f.loader.clear_cache(&mut host.context(&mut tasks)));
        assert!(!f.loader.is_loaded("a"));
        assert!(f.loader.cached_registry().is_none());

        f.loader.get_or_load("a").unwrap();
        f.loader.get_or_load("a").unwrap();
        assert_eq!(f.imports.get(), 2);
    }

    #[test]
    fn reload_rescans_with_new_generation() {
        let mut f = fixture(RunMode::Remote);
        assert_eq!(f.loader.registry().generation(), 0);
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        f.loader.clear_cache(&mut host.context(&mut tasks));
        assert_eq!(f.loader.registry().generation(), 1);
        assert_eq!(f.loader.scan_count(), 2);
    }

    #[test]
    fn reload_stops_active_and_uninstalls() {
        let mut f = fixture(RunMode::Remote);
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        let mut ctx = host.context(&mut tasks);
        f.loader.get_or_load("a").unwrap().start(&mut ctx).unwrap();
        f.loader.get_or_load("b").unwrap();
        f.log.take();

        f.loader.clear_cache(&mut ctx);
        assert_eq!(
            f.log.take(),
            vec!["a:hide", "a:exit", "a:uninstall", "b:uninstall"]
        );
        assert_eq!(f.loader.loaded_count(), 0);
    }

    #[test]
    fn reload_is_ignored_in_flash_mode() {
        let mut f = fixture(RunMode::Flash);
        f.loader.get_or_load("a").unwrap();
        f.loader.registry();
        let mut host = MockHost::new();
        let mut tasks = TaskQueue::new();
        assert!(!f.loader.clear_cache(&mut host.context(&mut tasks)));
        assert!(f.loader.is_loaded("a"));
        assert!(f.loader.cached_registry().is_some());
    }

    #[test]
    fn scan_then_load_scenario() {
        let mut f = fixture(RunMode::Remote);
        let reg = f.loader.registry();
        let paths: Vec<String> = reg
            .entries("")
            .iter()
            .map(|e| e.module_path.clone())
            .collect();
        assert_eq!(paths, vec!["a", "b"]);
        assert_eq!(f.imports.get(), 0);

        let slot = f.loader.get_or_load(&paths[0]).unwrap();
        assert_eq!(slot.state(), LifecycleState::Installed);
        assert_eq!(f.imports.get(), 1);
        assert!(!f.loader.is_loaded("b"));
    }
}
