//! JSON file persistence.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{HostError, Result};

/// A single JSON document at `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for `name` inside `dir`.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.json")),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document. A missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Snapshot`] if the file exists but cannot be read
    /// or parsed. The file is left as it is.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(self.refuse(&e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| self.refuse(&e))
    }

    fn refuse(&self, e: &dyn std::error::Error) -> HostError {
        error!(path = %self.path.display(), error = %e, "refusing snapshot");
        HostError::Snapshot {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    /// Writes the document, replacing the previous one atomically.
    pub fn save<T: Serialize>(&self, value: &T) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
