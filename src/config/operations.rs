//! Option loading and validation.

use super::model::LockOptions;
use crate::error::{LockError, Result};
use std::path::Path;

/// Read and write bits for the file owner.
const OWNER_READ_WRITE: u32 = 0o600;

impl LockOptions {
    /// Load options from a YAML file.
    ///
    /// Unknown fields are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(LockOptions)` - Successfully loaded and validated options
    /// * `Err(LockError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read options file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: LockOptions = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse options YAML: {}", e)))?;

        options.validate()?;
        Ok(options)
    }

    /// Serialize options to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize options: {}", e)))
    }

    /// Validate option values.
    ///
    /// - `file_mode` must fit in `0o7777`
    /// - `file_mode` must let the owner read and write the marker
    pub fn validate(&self) -> Result<()> {
        if self.file_mode > 0o7777 {
            return Err(LockError::Config(format!(
                "file_mode {:#o} must be at most 0o7777",
                self.file_mode
            )));
        }

        if self.file_mode & OWNER_READ_WRITE != OWNER_READ_WRITE {
            return Err(LockError::Config(format!(
                "file_mode {:#o} must grant the owner read and write access",
                self.file_mode
            )));
        }

        Ok(())
    }
}
