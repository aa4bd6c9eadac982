use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage directory missing or not writable: {0}")]
    Directory(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Client-local storage: a directory of small files written atomically.
#[derive(Debug, Clone)]
pub struct StorageDir {
    dir: PathBuf,
}

impl StorageDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if missing and checks it can be written.
    pub fn ensure(&self) -> Result<(), StorageError> {
        if self.dir.exists() {
            let meta = fs::metadata(&self.dir).map_err(|e| StorageError::Directory(e.to_string()))?;
            if !meta.is_dir() {
                return Err(StorageError::Directory("path is not a directory".into()));
            }
        } else {
            fs::create_dir_all(&self.dir).map_err(|e| StorageError::Directory(e.to_string()))?;
        }
        NamedTempFile::new_in(&self.dir).map_err(|e| StorageError::Directory(e.to_string()))?;
        Ok(())
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read_string(&self, name: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.dir.join(name)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a temp file next to the target, then renames it into place.
    pub fn write_atomic(&self, name: &str, content: &str) -> Result<PathBuf, StorageError> {
        self.ensure()?;

        let target = self.dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| StorageError::Io(e.error))?;
        Ok(target)
    }
}
