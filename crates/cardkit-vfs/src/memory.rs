//! In-memory VFS implementation.
//!
//! Backs the unit tests and the desktop runner's built-in demo tree. Nodes
//! live in a `BTreeMap` keyed by normalized absolute path, so a directory's
//! children form one contiguous key range.

use std::collections::BTreeMap;

use cardkit_types::error::{CardkitError, Result};

use crate::{EntryKind, Vfs, VfsEntry, VfsMetadata};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

impl Node {
    fn metadata(&self) -> VfsMetadata {
        match self {
            Node::File(data) => VfsMetadata {
                kind: EntryKind::File,
                size: data.len() as u64,
            },
            Node::Dir => VfsMetadata {
                kind: EntryKind::Directory,
                size: 0,
            },
        }
    }
}

/// A fully in-memory file tree.
#[derive(Debug, Clone)]
pub struct MemoryVfs {
    nodes: BTreeMap<String, Node>,
}

impl MemoryVfs {
    /// An empty tree containing only `/`.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self { nodes }
    }

    /// Write a file, creating parent directories as needed.
    pub fn put(&mut self, path: &str, data: impl AsRef<[u8]>) -> Result<()> {
        let path = normalize(path);
        self.mkdir(parent(&path))?;
        self.write(&path, data.as_ref())
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse repeated and trailing slashes and force a leading `/`.
///
/// `.` and `..` are kept as literal components.
fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Parent of a normalized path (`/` is its own parent).
fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Key prefix shared by every descendant of a normalized directory path.
fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{dir}/")
    }
}

impl Vfs for MemoryVfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let path = normalize(path);
        match self.nodes.get(&path) {
            Some(Node::Dir) => {},
            Some(Node::File(_)) => {
                return Err(CardkitError::Vfs(format!("not a directory: {path}")));
            },
            None => return Err(CardkitError::Vfs(format!("no such directory: {path}"))),
        }

        let prefix = child_prefix(&path);
        let entries = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, node)| {
                let rest = &key[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                let meta = node.metadata();
                Some(VfsEntry {
                    name: rest.to_string(),
                    kind: meta.kind,
                    size: meta.size,
                })
            })
            .collect();
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        match self.nodes.get(&path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(CardkitError::Vfs(format!("is a directory: {path}"))),
            None => Err(CardkitError::Vfs(format!("no such file: {path}"))),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        if matches!(self.nodes.get(&path), Some(Node::Dir)) {
            return Err(CardkitError::Vfs(format!("is a directory: {path}")));
        }
        let par = parent(&path);
        if !matches!(self.nodes.get(par), Some(Node::Dir)) {
            return Err(CardkitError::Vfs(format!(
                "parent directory does not exist: {par}"
            )));
        }
        self.nodes.insert(path, Node::File(data.to_vec()));
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<VfsMetadata> {
        let path = normalize(path);
        self.nodes
            .get(&path)
            .map(Node::metadata)
            .ok_or_else(|| CardkitError::Vfs(format!("no such path: {path}")))
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match self.nodes.get(&current) {
                Some(Node::Dir) => {},
                Some(Node::File(_)) => {
                    return Err(CardkitError::Vfs(format!("not a directory: {current}")));
                },
                None => {
                    self.nodes.insert(current.clone(), Node::Dir);
                },
            }
        }
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path == "/" {
            return Err(CardkitError::Vfs("cannot remove root".to_string()));
        }
        match self.nodes.get(&path) {
            Some(Node::Dir) => {
                let prefix = child_prefix(&path);
                let has_children = self
                    .nodes
                    .range(prefix.clone()..)
                    .next()
                    .is_some_and(|(k, _)| k.starts_with(&prefix));
                if has_children {
                    return Err(CardkitError::Vfs(format!("directory not empty: {path}")));
                }
            },
            Some(Node::File(_)) => {},
            None => return Err(CardkitError::Vfs(format!("no such path: {path}"))),
        }
        self.nodes.remove(&path);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize(path))
    }
}
