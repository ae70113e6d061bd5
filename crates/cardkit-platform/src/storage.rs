//! Namespaced key-value storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cardkit_types::error::{CardkitError, Result};

/// Longest namespace or key name the flash store accepts.
pub const MAX_NAME_LEN: usize = 15;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Small persistent settings grouped by namespace.
///
/// Writes may be buffered until [`KvStore::commit`].
pub trait KvStore {
    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>>;

    fn set_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<()>;

    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;

    fn set_blob(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<()>;

    /// Remove one key. Returns whether it existed.
    fn erase(&mut self, namespace: &str, key: &str) -> Result<bool>;

    /// Flush buffered writes.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Value {
    I32(i32),
    Blob(Vec<u8>),
}

type Table = BTreeMap<String, BTreeMap<String, Value>>;

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(CardkitError::Storage(format!(
            "{kind} must be 1-{MAX_NAME_LEN} bytes: {name:?}"
        )));
    }
    Ok(())
}

fn lookup<'a>(table: &'a Table, namespace: &str, key: &str) -> Result<Option<&'a Value>> {
    check_name("namespace", namespace)?;
    check_name("key", key)?;
    Ok(table.get(namespace).and_then(|ns| ns.get(key)))
}

fn insert(table: &mut Table, namespace: &str, key: &str, value: Value) -> Result<()> {
    check_name("namespace", namespace)?;
    check_name("key", key)?;
    table
        .entry(namespace.to_string())
        .or_default()
        .insert(key.to_string(), value);
    Ok(())
}

fn remove(table: &mut Table, namespace: &str, key: &str) -> Result<bool> {
    check_name("namespace", namespace)?;
    check_name("key", key)?;
    let Some(ns) = table.get_mut(namespace) else {
        return Ok(false);
    };
    let existed = ns.remove(key).is_some();
    if ns.is_empty() {
        table.remove(namespace);
    }
    Ok(existed)
}

fn as_i32(value: Option<&Value>, namespace: &str, key: &str) -> Result<Option<i32>> {
    match value {
        None => Ok(None),
        Some(Value::I32(v)) => Ok(Some(*v)),
        Some(Value::Blob(_)) => Err(CardkitError::Storage(format!(
            "{namespace}/{key} holds a blob, not an i32"
        ))),
    }
}

fn as_blob(value: Option<&Value>, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
    match value {
        None => Ok(None),
        Some(Value::Blob(v)) => Ok(Some(v.clone())),
        Some(Value::I32(_)) => Err(CardkitError::Storage(format!(
            "{namespace}/{key} holds an i32, not a blob"
        ))),
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: Table,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>> {
        as_i32(lookup(&self.table, namespace, key)?, namespace, key)
    }

    fn set_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<()> {
        insert(&mut self.table, namespace, key, Value::I32(value))
    }

    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        as_blob(lookup(&self.table, namespace, key)?, namespace, key)
    }

    fn set_blob(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<()> {
        insert(&mut self.table, namespace, key, Value::Blob(value.to_vec()))
    }

    fn erase(&mut self, namespace: &str, key: &str) -> Result<bool> {
        remove(&mut self.table, namespace, key)
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Desktop store persisted as one JSON document.
///
/// Writes are buffered in memory and written out on [`KvStore::commit`].
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: Table,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            log::debug!("[storage] {} not found, starting empty", path.display());
            Table::new()
        };
        Ok(Self {
            path,
            table,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl KvStore for JsonFileStore {
    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>> {
        as_i32(lookup(&self.table, namespace, key)?, namespace, key)
    }

    fn set_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<()> {
        insert(&mut self.table, namespace, key, Value::I32(value))?;
        self.dirty = true;
        Ok(())
    }

    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        as_blob(lookup(&self.table, namespace, key)?, namespace, key)
    }

    fn set_blob(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<()> {
        insert(&mut self.table, namespace, key, Value::Blob(value.to_vec()))?;
        self.dirty = true;
        Ok(())
    }

    fn erase(&mut self, namespace: &str, key: &str) -> Result<bool> {
        let existed = remove(&mut self.table, namespace, key)?;
        self.dirty |= existed;
        Ok(existed)
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.table)?;
        fs::write(&self.path, text)?;
        self.dirty = false;
        log::debug!("[storage] committed {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- MemoryStore --

    #[test]
    fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_i32("settings", "brightness").unwrap(), None);
        assert_eq!(store.get_blob("settings", "name").unwrap(), None);
    }

    #[test]
    fn i32_roundtrip() {
        let mut store = MemoryStore::new();
        store.set_i32("settings", "brightness", 128).unwrap();
        assert_eq!(store.get_i32("settings", "brightness").unwrap(), Some(128));
        store.set_i32("settings", "brightness", -1).unwrap();
        assert_eq!(store.get_i32("settings", "brightness").unwrap(), Some(-1));
    }

    #[test]
    fn namespaces_are_isolated() {
        let mut store = MemoryStore::new();
        store.set_i32("settings", "volume", 50).unwrap();
        assert_eq!(store.get_i32("wifi", "volume").unwrap(), None);
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut store = MemoryStore::new();
        store.set_blob("wifi", "ssid", b"home").unwrap();
        assert!(matches!(
            store.get_i32("wifi", "ssid"),
            Err(CardkitError::Storage(_))
        ));
        store.set_i32("wifi", "channel", 6).unwrap();
        assert!(store.get_blob("wifi", "channel").is_err());
    }

    #[test]
    fn long_names_are_rejected() {
        let mut store = MemoryStore::new();
        assert!(store.set_i32("a_namespace_too_long", "k", 1).is_err());
        assert!(store.set_i32("settings", "", 1).is_err());
        assert!(store.set_i32("settings", "exactly_15_char", 1).is_ok());
    }

    #[test]
    fn erase_reports_existence() {
        let mut store = MemoryStore::new();
        store.set_i32("settings", "volume", 3).unwrap();
        assert!(store.erase("settings", "volume").unwrap());
        assert!(!store.erase("settings", "volume").unwrap());
        assert_eq!(store.get_i32("settings", "volume").unwrap(), None);
    }

    // -- JsonFileStore --

    #[test]
    fn json_store_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nvs.json")).unwrap();
        assert_eq!(store.get_i32("settings", "volume").unwrap(), None);
        assert!(!store.is_dirty());
    }

    #[test]
    fn json_store_persists_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nvs.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_i32("settings", "brightness", 200).unwrap();
        store.set_blob("settings", "owner", b"ada").unwrap();
        assert!(store.is_dirty());
        store.commit().unwrap();
        assert!(!store.is_dirty());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_i32("settings", "brightness").unwrap(),
            Some(200)
        );
        assert_eq!(
            reopened.get_blob("settings", "owner").unwrap(),
            Some(b"ada".to_vec())
        );
    }

    #[test]
    fn json_store_uncommitted_writes_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nvs.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_i32("settings", "volume", 9).unwrap();
        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nvs.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(CardkitError::Json(_))
        ));
    }
}
