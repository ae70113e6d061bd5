//! Host-directory VFS.
//!
//! Maps VFS paths onto a real directory so an app tree can be developed on
//! the desktop and scanned exactly as the device would scan its flash.

use std::fs;
use std::path::{Component, Path, PathBuf};

use cardkit_types::error::{CardkitError, Result};

use crate::{EntryKind, Vfs, VfsEntry, VfsMetadata};

/// A VFS rooted at a host directory.
#[derive(Debug, Clone)]
pub struct DiskVfs {
    root: PathBuf,
}

impl DiskVfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a VFS path to a host path. Components that would climb out of
    /// the root are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut out = self.root.clone();
        for comp in Path::new(path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {},
                _ => return Err(CardkitError::Vfs(format!("path escapes root: {path}"))),
            }
        }
        Ok(out)
    }
}

fn metadata_of(meta: &fs::Metadata) -> VfsMetadata {
    if meta.is_dir() {
        VfsMetadata {
            kind: EntryKind::Directory,
            size: 0,
        }
    } else {
        VfsMetadata {
            kind: EntryKind::File,
            size: meta.len(),
        }
    }
}

impl Vfs for DiskVfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let dir = self.resolve(path)?;
        let mut entries = Vec::new();
        for item in fs::read_dir(&dir)? {
            let item = item?;
            let Ok(name) = item.file_name().into_string() else {
                log::warn!("skipping non-UTF-8 entry in {}", dir.display());
                continue;
            };
            let meta = metadata_of(&item.metadata()?);
            entries.push(VfsEntry {
                name,
                kind: meta.kind,
                size: meta.size,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<()> {
        Ok(fs::write(self.resolve(path)?, data)?)
    }

    fn stat(&self, path: &str) -> Result<VfsMetadata> {
        Ok(metadata_of(&fs::metadata(self.resolve(path)?)?))
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        Ok(fs::create_dir_all(self.resolve(path)?)?)
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if target == self.root {
            return Err(CardkitError::Vfs("cannot remove root".to_string()));
        }
        if fs::metadata(&target)?.is_dir() {
            fs::remove_dir(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        Ok(())
    }
}
