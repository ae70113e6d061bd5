//! Manifest-driven app discovery.
//!
//! [`Registry::scan`] walks the apps tree and builds one [`MenuNode`] per
//! directory that has a manifest. It reads manifests only and never
//! constructs an app.

use std::collections::BTreeMap;

use cardkit_vfs::{Vfs, join};

use crate::manifest::{Manifest, title_case};

/// Deepest submenu nesting a scan follows. Directories below it are
/// skipped, which also ends a scan that a symlink loop would keep going.
pub const MAX_MENU_DEPTH: usize = 8;

/// Whether a menu entry launches an app or opens a submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppKind {
    App,
    Submenu,
}

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    /// `/`-joined path relative to the apps root, e.g. `demo/keyboard_demo`.
    /// For a submenu this is also the key of its [`MenuNode`].
    pub module_path: String,
    /// Display name from the manifest.
    pub name: String,
    pub kind: AppKind,
}

impl AppDescriptor {
    pub fn is_submenu(&self) -> bool {
        self.kind == AppKind::Submenu
    }
}

/// One directory level of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    /// Relative directory path, `""` for the root.
    pub path: String,
    pub title: String,
    /// Entries in manifest declaration order.
    pub entries: Vec<AppDescriptor>,
}

/// The discovered menu tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    nodes: BTreeMap<String, MenuNode>,
    generation: u64,
}

impl Registry {
    /// Scan `apps_root` recursively. `launcher_module` is left out at every
    /// level.
    ///
    /// A missing root or root manifest yields an empty registry. A malformed
    /// manifest yields a node with no entries and a warning.
    pub fn scan(vfs: &dyn Vfs, apps_root: &str, launcher_module: &str) -> Self {
        let mut registry = Self::default();
        if !vfs.is_dir(apps_root) {
            log::warn!("[scan] apps root {apps_root} not found");
            return registry;
        }
        let mut scanner = Scanner {
            vfs,
            apps_root,
            launcher_module,
            nodes: &mut registry.nodes,
        };
        scanner.scan_dir("", "");
        let apps = registry
            .nodes
            .values()
            .flat_map(|n| &n.entries)
            .filter(|e| e.kind == AppKind::App)
            .count();
        log::info!(
            "[scan] {} menu(s), {apps} app(s) under {apps_root}",
            registry.nodes.len()
        );
        registry
    }

    /// The root menu, if the apps root has a manifest.
    pub fn root(&self) -> Option<&MenuNode> {
        self.nodes.get("")
    }

    pub fn node(&self, path: &str) -> Option<&MenuNode> {
        self.nodes.get(path)
    }

    /// Every node, keyed by relative path.
    pub fn nodes(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.values()
    }

    /// Entries of a node, empty for an unknown path.
    pub fn entries(&self, path: &str) -> &[AppDescriptor] {
        self.nodes
            .get(path)
            .map(|n| n.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.values().all(|n| n.entries.is_empty())
    }

    /// How many scans preceded this one. Set by the loader.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }
}

struct Scanner<'a> {
    vfs: &'a dyn Vfs,
    apps_root: &'a str,
    launcher_module: &'a str,
    nodes: &'a mut BTreeMap<String, MenuNode>,
}

impl Scanner<'_> {
    fn dir_of(&self, relative: &str) -> String {
        if relative.is_empty() {
            self.apps_root.to_string()
        } else {
            join(self.apps_root, relative)
        }
    }

    /// Scan one directory. Returns whether it produced a node.
    fn scan_dir(&mut self, relative: &str, title: &str) -> bool {
        let dir = self.dir_of(relative);
        let manifest = match Manifest::read(self.vfs, &dir) {
            Ok(Some(m)) => m,
            Ok(None) => {
                log::debug!("[scan] no manifest in {dir}");
                return false;
            },
            Err(e) => {
                log::warn!("[scan] {dir}: {e}");
                Manifest::default()
            },
        };

        let mut entries = Vec::with_capacity(manifest.len());
        for (module, name) in manifest.entries {
            if module == self.launcher_module {
                continue;
            }
            if module.starts_with('_') || module.starts_with('.') || module.is_empty() {
                log::debug!("[scan] skipping hidden entry {module:?} in {dir}");
                continue;
            }
            let module_path = if relative.is_empty() {
                module.clone()
            } else {
                format!("{relative}/{module}")
            };

            if self.vfs.is_dir(&join(&dir, &module)) {
                if module_path.split('/').count() > MAX_MENU_DEPTH {
                    log::warn!("[scan] {module_path} is nested too deep, skipped");
                    continue;
                }
                let sub_title = if name.is_empty() {
                    title_case(&module)
                } else {
                    name.clone()
                };
                if self.scan_dir(&module_path, &sub_title) {
                    log::debug!("[scan] submenu {sub_title} ({module_path})");
                    entries.push(AppDescriptor {
                        module_path,
                        name: sub_title,
                        kind: AppKind::Submenu,
                    });
                } else {
                    log::warn!("[scan] {module_path} is a directory without a manifest, skipped");
                }
            } else {
                log::debug!("[scan] app {name} ({module_path})");
                entries.push(AppDescriptor {
                    module_path,
                    name,
                    kind: AppKind::App,
                });
            }
        }

        self.nodes.insert(
            relative.to_string(),
            MenuNode {
                path: relative.to_string(),
                title: title.to_string(),
                entries,
            },
        );
        true
    }
}
