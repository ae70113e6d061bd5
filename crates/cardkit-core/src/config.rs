//! Framework configuration (`cardkit.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use cardkit_types::error::{CardkitError, Result};
use cardkit_vfs::Vfs;

/// Apps root used when a development tree is mounted.
pub const REMOTE_APPS_ROOT: &str = "/remote/apps";
/// Apps root on the device flash.
pub const FLASH_APPS_ROOT: &str = "/flash/apps";
/// Smallest screen the launcher and bundled apps can lay out on.
pub const MIN_SCREEN_WIDTH: u32 = 120;
pub const MIN_SCREEN_HEIGHT: u32 = 64;

/// Where the app tree is served from.
///
/// `Remote` is the development mode: apps are served from a mounted tree
/// and may be reloaded without rebooting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Remote,
    Flash,
}

impl RunMode {
    /// Remote when `/remote/apps` exists, Flash otherwise.
    pub fn detect(vfs: &dyn Vfs) -> Self {
        if vfs.is_dir(REMOTE_APPS_ROOT) {
            Self::Remote
        } else {
            Self::Flash
        }
    }

    pub fn apps_root(self) -> &'static str {
        match self {
            Self::Remote => REMOTE_APPS_ROOT,
            Self::Flash => FLASH_APPS_ROOT,
        }
    }

    pub fn is_dev(self) -> bool {
        self == Self::Remote
    }

    /// Label shown in the launcher title bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Flash => "flash",
        }
    }
}

/// Top-level configuration. Every field has a default, so an empty file is
/// a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Forced run mode. Detected from the VFS when absent.
    #[serde(default)]
    pub run_mode: Option<RunMode>,
    /// Overrides the run mode's apps root.
    #[serde(default)]
    pub apps_root: Option<String>,
    /// Module name excluded from every menu level.
    #[serde(default = "default_launcher_module")]
    pub launcher_module: String,
    /// Main loop period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// How long a launcher status message stays up.
    #[serde(default = "default_status_ms")]
    pub status_ms: u64,
    /// Menu rows shown at once.
    #[serde(default = "default_visible_items")]
    pub visible_items: usize,
    #[serde(default = "default_width")]
    pub screen_width: u32,
    #[serde(default = "default_height")]
    pub screen_height: u32,
    /// Launcher title at the root menu.
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_launcher_module() -> String {
    "launcher".to_string()
}
fn default_tick_ms() -> u64 {
    10
}
fn default_status_ms() -> u64 {
    2000
}
fn default_visible_items() -> usize {
    4
}
fn default_width() -> u32 {
    240
}
fn default_height() -> u32 {
    135
}
fn default_title() -> String {
    "Cardputer".to_string()
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            run_mode: None,
            apps_root: None,
            launcher_module: default_launcher_module(),
            tick_ms: default_tick_ms(),
            status_ms: default_status_ms(),
            visible_items: default_visible_items(),
            screen_width: default_width(),
            screen_height: default_height(),
            title: default_title(),
        }
    }
}

impl FrameworkConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CardkitError::Config(format!("cardkit.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file from the host file system.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(CardkitError::Config("tick_ms must be positive".into()));
        }
        if self.visible_items == 0 {
            return Err(CardkitError::Config(
                "visible_items must be positive".into(),
            ));
        }
        if self.launcher_module.is_empty() {
            return Err(CardkitError::Config(
                "launcher_module must not be empty".into(),
            ));
        }
        if self.screen_width < MIN_SCREEN_WIDTH || self.screen_height < MIN_SCREEN_HEIGHT {
            return Err(CardkitError::Config(format!(
                "screen must be at least {MIN_SCREEN_WIDTH}x{MIN_SCREEN_HEIGHT}, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        Ok(())
    }

    /// The configured run mode, or the one detected from `vfs`.
    pub fn resolve_run_mode(&self, vfs: &dyn Vfs) -> RunMode {
        self.run_mode.unwrap_or_else(|| RunMode::detect(vfs))
    }

    /// The configured apps root, or the run mode's default.
    pub fn resolve_apps_root(&self, mode: RunMode) -> String {
        self.apps_root
            .clone()
            .unwrap_or_else(|| mode.apps_root().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkit_vfs::MemoryVfs;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = FrameworkConfig::from_toml("").unwrap();
        assert_eq!(cfg, FrameworkConfig::default());
        assert_eq!(cfg.tick_ms, 10);
        assert_eq!(cfg.visible_items, 4);
        assert_eq!(cfg.launcher_module, "launcher");
        assert_eq!(cfg.title, "Cardputer");
        assert_eq!((cfg.screen_width, cfg.screen_height), (240, 135));
    }

    #[test]
    fn fields_override() {
        let cfg = FrameworkConfig::from_toml(
            r#"
            run_mode = "remote"
            apps_root = "/sd/apps"
            tick_ms = 20
            title = "Pocket"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.run_mode, Some(RunMode::Remote));
        assert_eq!(cfg.apps_root.as_deref(), Some("/sd/apps"));
        assert_eq!(cfg.tick_ms, 20);
        assert_eq!(cfg.title, "Pocket");
        assert_eq!(cfg.status_ms, 2000);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            FrameworkConfig::from_toml("tick_ms = 0"),
            Err(CardkitError::Config(_))
        ));
        assert!(matches!(
            FrameworkConfig::from_toml("visible_items = 0"),
            Err(CardkitError::Config(_))
        ));
        assert!(matches!(
            FrameworkConfig::from_toml("run_mode = \"usb\""),
            Err(CardkitError::Config(_))
        ));
    }

    #[test]
    fn tiny_screens_are_rejected() {
        let err = FrameworkConfig::from_toml("screen_width = 16").unwrap_err();
        assert!(err.to_string().contains("16x135"));
        assert!(FrameworkConfig::from_toml("screen_height = 40").is_err());
        let cfg = FrameworkConfig::from_toml("screen_width = 120\nscreen_height = 64").unwrap();
        assert_eq!((cfg.screen_width, cfg.screen_height), (120, 64));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardkit.toml");
        std::fs::write(&path, "status_ms = 500\n").unwrap();
        let cfg = FrameworkConfig::load(&path).unwrap();
        assert_eq!(cfg.status_ms, 500);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrameworkConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CardkitError::Io(_)));
    }

    #[test]
    fn run_mode_detection() {
        let mut vfs = MemoryVfs::new();
        assert_eq!(RunMode::detect(&vfs), RunMode::Flash);
        vfs.mkdir("/remote/apps").unwrap();
        assert_eq!(RunMode::detect(&vfs), RunMode::Remote);
    }

    #[test]
    fn forced_run_mode_wins_over_detection() {
        let mut vfs = MemoryVfs::new();
        vfs.mkdir("/remote/apps").unwrap();
        let cfg = FrameworkConfig {
            run_mode: Some(RunMode::Flash),
            ..Default::default()
        };
        let mode = cfg.resolve_run_mode(&vfs);
        assert_eq!(mode, RunMode::Flash);
        assert_eq!(cfg.resolve_apps_root(mode), "/flash/apps");
        assert!(!mode.is_dev());
    }

    #[test]
    fn apps_root_override() {
        let cfg = FrameworkConfig {
            apps_root: Some("/sd/apps".into()),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_apps_root(RunMode::Remote), "/sd/apps");
    }
}
