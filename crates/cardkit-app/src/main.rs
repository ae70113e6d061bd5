//! cardkit desktop runner.
//!
//! Drives the framework against a terminal: the screen is printed as a
//! character grid whenever it changes, and each stdin line is a batch of key
//! presses (see `keys.rs` for the syntax). `quit` or end of input exits.

mod host;
mod keys;
mod vfs_setup;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cardkit_core::platform::{JsonFileStore, KvStore, MemoryStore};
use cardkit_core::vfs::Vfs;
use cardkit_core::{AppCatalog, Framework, FrameworkConfig, RunMode};

use host::{TerminalHost, TextDisplay};

const USAGE: &str = "\
Usage: cardkit-app [OPTIONS]

Options:
  --config PATH    Read framework settings from a cardkit.toml
  --apps-dir DIR   Serve the app tree from a host directory (development mode)
  --remote         Force development mode with the bundled app tree
  --store PATH     Persist app settings to a JSON file
  -h, --help       Print this help";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    apps_dir: Option<PathBuf>,
    remote: bool,
    store: Option<PathBuf>,
    help: bool,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .map(PathBuf::from)
                .with_context(|| format!("{name} needs a value"))
        };
        match arg.as_str() {
            "--config" => out.config = Some(value("--config")?),
            "--apps-dir" => out.apps_dir = Some(value("--apps-dir")?),
            "--store" => out.store = Some(value("--store")?),
            "--remote" => out.remote = true,
            "-h" | "--help" => out.help = true,
            other => anyhow::bail!("unknown argument: {other}\n\n{USAGE}"),
        }
    }
    Ok(out)
}

fn load_config(args: &Args) -> Result<FrameworkConfig> {
    let mut config = match &args.config {
        Some(path) => FrameworkConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FrameworkConfig::default(),
    };
    if args.remote {
        config.run_mode = Some(RunMode::Remote);
    }
    if args.apps_dir.is_some() {
        // A mounted tree is a development tree rooted at the directory.
        config.run_mode.get_or_insert(RunMode::Remote);
        config.apps_root = Some("/".to_string());
    }
    Ok(config)
}

fn open_vfs(args: &Args, config: &FrameworkConfig) -> Result<Box<dyn Vfs>> {
    if let Some(dir) = &args.apps_dir {
        log::info!("Serving apps from {}", dir.display());
        return Ok(Box::new(vfs_setup::disk_vfs(dir)?));
    }
    let mode = config.run_mode.unwrap_or(RunMode::Flash);
    let vfs = vfs_setup::bundled_vfs(mode).context("installing bundled apps")?;
    Ok(Box::new(vfs))
}

fn open_store(args: &Args) -> Result<Box<dyn KvStore>> {
    Ok(match &args.store {
        Some(path) => Box::new(
            JsonFileStore::open(path)
                .with_context(|| format!("opening store {}", path.display()))?,
        ),
        None => Box::new(MemoryStore::new()),
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = load_config(&args)?;
    log::info!(
        "Starting cardkit ({}x{}, {} ms tick)",
        config.screen_width,
        config.screen_height,
        config.tick_ms,
    );

    let vfs = open_vfs(&args, &config)?;
    let storage = open_store(&args)?;

    let mut catalog = AppCatalog::new();
    cardkit_apps::register_all(&mut catalog);
    log::info!("Registered {} apps", catalog.len());

    let display = TextDisplay::new(
        config.screen_width,
        config.screen_height,
        Box::new(std::io::stdout()),
    );
    let host = TerminalHost::new(display, storage, TerminalHost::spawn_stdin_reader());

    let mut framework = Framework::new(host, vfs, catalog, config);
    log::info!("Run mode: {}", framework.run_mode().label());
    framework.run().context("framework stopped")?;

    log::info!("Exiting cardkit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_is_default() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn all_options() {
        let args = parse(&[
            "--config",
            "c.toml",
            "--apps-dir",
            "apps",
            "--remote",
            "--store",
            "s.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        assert_eq!(args.apps_dir, Some(PathBuf::from("apps")));
        assert_eq!(args.store, Some(PathBuf::from("s.json")));
        assert!(args.remote);
    }

    #[test]
    fn missing_value_and_unknown_flag_fail() {
        assert!(parse(&["--config"]).is_err());
        let err = parse(&["--bogus"]).unwrap_err().to_string();
        assert!(err.contains("--bogus"));
    }

    #[test]
    fn apps_dir_mounts_a_dev_tree_at_root() {
        let args = parse(&["--apps-dir", "apps"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.run_mode, Some(RunMode::Remote));
        assert_eq!(config.apps_root.as_deref(), Some("/"));
    }

    #[test]
    fn config_file_run_mode_wins_over_apps_dir_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardkit.toml");
        std::fs::write(&path, "run_mode = \"flash\"\ntick_ms = 20\n").unwrap();
        let args = Args {
            config: Some(path),
            apps_dir: Some(dir.path().to_path_buf()),
            ..Args::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.run_mode, Some(RunMode::Flash));
        assert_eq!(config.tick_ms, 20);
    }

    #[test]
    fn bad_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardkit.toml");
        std::fs::write(&path, "tick_ms = 0\n").unwrap();
        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        let err = format!("{:#}", load_config(&args).unwrap_err());
        assert!(err.contains("cardkit.toml"));
        assert!(err.contains("tick_ms"));
    }

    #[test]
    fn bundled_store_and_vfs_open() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            store: Some(dir.path().join("settings.json")),
            ..Args::default()
        };
        let mut store = open_store(&args).unwrap();
        store.set_i32("settings", "volume", 3).unwrap();
        store.commit().unwrap();
        assert!(dir.path().join("settings.json").exists());

        let vfs = open_vfs(&Args::default(), &FrameworkConfig::default()).unwrap();
        assert!(vfs.exists("/flash/apps/manifest.json"));
    }
}
