//! Save file persistence
//!
//! The save file is a pretty-printed JSON array of [`PowerRecord`]s. Its
//! presence means a restore is pending; its absence means there is nothing
//! to power back up.

use crate::error::{RecordError, Result};
use crate::types::PowerRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the save file
pub const DEFAULT_SAVE_FILE: &str = "/tmp/saved-unpowered-usb-devices.json";

/// Handle to the save file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFile {
    path: PathBuf,
}

impl Default for SaveFile {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_FILE)
    }
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a restore is pending
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all records from the save file
    pub fn load(&self) -> Result<Vec<PowerRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|source| RecordError::Io {
            path: self.path.clone(),
            source,
        })?;

        let records: Vec<PowerRecord> =
            serde_json::from_str(&content).map_err(|source| RecordError::Json {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} record(s) from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Read records if the file exists, otherwise return an empty list
    pub fn load_or_empty(&self) -> Result<Vec<PowerRecord>> {
        if self.exists() {
            self.load()
        } else {
            Ok(Vec::new())
        }
    }

    /// Overwrite the save file with `records`
    ///
    /// Content is written to a sibling temporary file and renamed into place,
    /// so a crash mid-write never leaves a truncated record list behind.
    pub fn save(&self, records: &[PowerRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records).map_err(|source| RecordError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| RecordError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content).map_err(|source| RecordError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| RecordError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Delete the save file. A missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(RecordError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        assert_eq!(
            SaveFile::default().path(),
            Path::new("/tmp/saved-unpowered-usb-devices.json")
        );
    }

    #[test]
    fn test_tmp_path_is_sibling() {
        let file = SaveFile::new("/var/lib/x/saved.json");
        assert_eq!(file.tmp_path(), PathBuf::from("/var/lib/x/saved.json.tmp"));
    }

    #[test]
    fn test_load_or_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = SaveFile::new(dir.path().join("missing.json"));
        assert!(file.load_or_empty().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = SaveFile::new(dir.path().join("missing.json"));
        assert!(matches!(file.load(), Err(RecordError::Io { .. })));
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let file = SaveFile::new(dir.path().join("missing.json"));
        assert!(file.remove().is_ok());
    }
}
