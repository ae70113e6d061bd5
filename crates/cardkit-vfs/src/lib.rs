//! Virtual file system abstraction.
//!
//! The app registry discovers manifests through the [`Vfs`] trait rather than
//! touching the host file system directly, so the same scan runs against the
//! device flash, a mounted development directory, or an in-memory tree in
//! tests.

mod disk;
mod memory;

pub use disk::DiskVfs;
pub use memory::MemoryVfs;

use cardkit_types::error::Result;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child returned by [`Vfs::readdir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Result of [`Vfs::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfsMetadata {
    pub kind: EntryKind,
    pub size: u64,
}

/// A hierarchical file store addressed by absolute `/`-separated paths.
pub trait Vfs {
    /// List the direct children of a directory, sorted by name.
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>>;

    /// Read a whole file.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or replace a file. The parent directory must exist.
    fn write(&mut self, path: &str, data: &[u8]) -> Result<()>;

    fn stat(&self, path: &str) -> Result<VfsMetadata>;

    /// Create a directory and any missing parents.
    fn mkdir(&mut self, path: &str) -> Result<()>;

    /// Remove a file or an empty directory.
    fn remove(&mut self, path: &str) -> Result<()>;

    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.stat(path)
            .is_ok_and(|meta| meta.kind == EntryKind::Directory)
    }
}

/// Join a directory path and a child name with exactly one `/`.
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_root_and_slashes() {
        assert_eq!(join("/", "apps"), "/apps");
        assert_eq!(join("/apps", "manifest.json"), "/apps/manifest.json");
        assert_eq!(join("/apps/", "/demo"), "/apps/demo");
        assert_eq!(join("", "x"), "/x");
    }

    #[test]
    fn default_is_dir_uses_stat() {
        let mut vfs = MemoryVfs::new();
        vfs.mkdir("/apps").unwrap();
        vfs.write("/apps/manifest.json", b"{}").unwrap();
        assert!(vfs.is_dir("/apps"));
        assert!(!vfs.is_dir("/apps/manifest.json"));
        assert!(!vfs.is_dir("/missing"));
    }
}
