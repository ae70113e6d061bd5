//! Per-directory `manifest.json` parsing.
//!
//! A manifest is a single JSON object mapping module names to display
//! names. Declaration order is the menu order.

use serde_json::Value;

use cardkit_types::error::{CardkitError, Result};
use cardkit_vfs::{Vfs, join};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Parsed manifest: `(module name, display name)` in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest bytes. Anything other than an object of strings is
    /// rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CardkitError::Manifest(format!("invalid JSON: {e}")))?;
        let Value::Object(map) = value else {
            return Err(CardkitError::Manifest(
                "top level must be an object".to_string(),
            ));
        };
        let entries = map
            .into_iter()
            .map(|(module, name)| match name {
                Value::String(name) => Ok((module, name)),
                other => Err(CardkitError::Manifest(format!(
                    "display name for {module:?} must be a string, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Read `<dir>/manifest.json`. `Ok(None)` when the file does not exist.
    pub fn read(vfs: &dyn Vfs, dir: &str) -> Result<Option<Self>> {
        let path = join(dir, MANIFEST_FILE);
        if !vfs.exists(&path) {
            return Ok(None);
        }
        let bytes = vfs.read(&path)?;
        Self::parse(&bytes).map(Some)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `"sound_demo"` -> `"Sound Demo"`. Used when a manifest gives a submenu an
/// empty display name.
pub fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
