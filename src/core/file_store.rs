use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::AiTestGenError;

/// Narrow file access used by the generation pipeline
///
/// Paths are project-relative unless absolute.
pub trait FileStore: Send + Sync {
    /// File contents, or `None` when the file does not exist
    fn read(&self, path: &Path) -> Result<Option<String>, AiTestGenError>;

    /// Write a file, replacing any previous contents
    fn write(&self, path: &Path, text: &str) -> Result<(), AiTestGenError>;

    /// Create a directory and its parents
    fn ensure_directory(&self, path: &Path) -> Result<(), AiTestGenError>;

    fn exists(&self, path: &Path) -> bool;
}

/// [`FileStore`] over the real filesystem, rooted at a project directory
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a project path
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn store_error(path: &Path, source: std::io::Error) -> AiTestGenError {
    AiTestGenError::FileStore {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStore for FsFileStore {
    fn read(&self, path: &Path) -> Result<Option<String>, AiTestGenError> {
        let full = self.resolve(path);
        match fs::read_to_string(&full) {
            Ok(content) => {
                debug!("Read {} ({} bytes)", full.display(), content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error(&full, e)),
        }
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), AiTestGenError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| store_error(parent, e))?;
        }
        fs::write(&full, text).map_err(|e| store_error(&full, e))?;
        debug!("Wrote {} ({} bytes)", full.display(), text.len());
        Ok(())
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), AiTestGenError> {
        let full = self.resolve(path);
        fs::create_dir_all(&full).map_err(|e| store_error(&full, e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

/// In-memory [`FileStore`], used for dry runs and tests
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), text.into());
        }
        self
    }

    /// All stored paths in sorted order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl FileStore for MemoryFileStore {
    fn read(&self, path: &Path) -> Result<Option<String>, AiTestGenError> {
        Ok(self
            .files
            .lock()
            .map_err(|_| AiTestGenError::Input("file store lock poisoned".to_string()))?
            .get(path)
            .cloned())
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), AiTestGenError> {
        self.files
            .lock()
            .map_err(|_| AiTestGenError::Input("file store lock poisoned".to_string()))?
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn ensure_directory(&self, _path: &Path) -> Result<(), AiTestGenError> {
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}
