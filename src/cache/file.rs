use super::StateStore;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".cf-images-state.json";

/// [`StateStore`] backed by one JSON object file (`{ key: value, .. }`).
///
/// Writes go through a sibling temp file and a rename so a crash mid-write
/// leaves the previous state intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from `CF_IMAGES_STATE_PATH`, falling back to [`DEFAULT_STATE_FILE`].
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let path = std::env::var("CF_IMAGES_STATE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn update(&self, key: &str, value: Value) -> Result<()> {
        let mut all = match self.read_all() {
            Ok(all) => all,
            Err(Error::Serialization(e)) => {
                warn!(
                    "Overwriting unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                Map::new()
            }
            Err(e) => return Err(e),
        };
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&all)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
