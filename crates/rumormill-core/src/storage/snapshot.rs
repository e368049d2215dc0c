use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// A JSON snapshot on disk, guarded by a sidecar lock file.
///
/// Writes go to a temp file that is renamed over the snapshot while holding an
/// exclusive lock, so a reader (or a restart) only ever sees a complete file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn open_lock(&self) -> Result<fs::File, CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Serialize `value` and atomically replace the snapshot.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(value)?;
        let lock = self.open_lock()?;
        fs2::FileExt::lock_exclusive(&lock).map_err(CoreError::Io)?;

        let tmp = self.tmp_path();
        let result = (|| -> Result<(), CoreError> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        })();

        fs2::FileExt::unlock(&lock).map_err(CoreError::Io)?;
        result
    }

    /// Load the snapshot. `Ok(None)` when nothing has been written yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let lock = self.open_lock()?;
        fs2::FileExt::lock_shared(&lock).map_err(CoreError::Io)?;
        let data = fs::read_to_string(&self.path);
        fs2::FileExt::unlock(&lock).map_err(CoreError::Io)?;
        Ok(Some(serde_json::from_str(&data?)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u64,
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let file = SnapshotFile::new(tmp.path().join("nested/state.json"));

        assert!(file.load::<Counter>().unwrap().is_none());

        file.save(&Counter { value: 3 }).unwrap();
        file.save(&Counter { value: 4 }).unwrap();
        assert_eq!(file.load::<Counter>().unwrap(), Some(Counter { value: 4 }));
        assert!(!tmp.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let file = SnapshotFile::new(path);
        assert!(file.load::<Counter>().is_err());
    }
}
