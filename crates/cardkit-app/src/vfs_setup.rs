use std::path::Path;

use cardkit_core::RunMode;
use cardkit_core::vfs::{DiskVfs, MemoryVfs, Vfs};

/// In-memory file system holding the bundled app tree under the run mode's
/// apps root.
pub fn bundled_vfs(mode: RunMode) -> cardkit_core::Result<MemoryVfs> {
    let mut vfs = MemoryVfs::new();
    vfs.mkdir("/flash")?;
    cardkit_apps::install_manifests(&mut vfs, mode.apps_root())?;
    Ok(vfs)
}

/// A host directory mounted as the apps root.
pub fn disk_vfs(dir: &Path) -> anyhow::Result<DiskVfs> {
    anyhow::ensure!(dir.is_dir(), "apps dir {} is not a directory", dir.display());
    let vfs = DiskVfs::new(dir);
    if !vfs.exists("/manifest.json") {
        log::warn!("No manifest.json in {}; the menu will be empty", dir.display());
    }
    Ok(vfs)
}
