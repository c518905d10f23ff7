/*!
 * File Resources
 *
 * File handles guarded by explicit termination, plus a sidecar lock-file
 * layer for exclusive access
 */

use crate::core::guard::{Acquire, Chained, GuardError, GuardResult, Layer, LifecycleGuard, Resource};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How to open a [`FileResource`]
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    pub path: PathBuf,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
}

impl FileConfig {
    /// Open an existing file for reading
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create (or truncate) a file for reading and writing
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: true,
            create: true,
            truncate: true,
            append: false,
        }
    }

    /// Open or create a file for appending
    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: true,
            create: true,
            truncate: false,
            append: true,
        }
    }
}

/// An open file handle
#[derive(Debug)]
pub struct FileResource {
    file: File,
    path: PathBuf,
    writable: bool,
}

impl FileResource {
    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file from the start
    pub fn read_to_string(&mut self) -> GuardResult<String> {
        let mut out = String::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut out))
            .map_err(|e| GuardError::OperationFailed(format!("{}: {}", self.path.display(), e)))?;
        Ok(out)
    }

    /// Write all bytes at the current position
    pub fn write_all(&mut self, bytes: &[u8]) -> GuardResult<()> {
        if !self.writable {
            return Err(GuardError::OperationFailed(format!(
                "{}: opened read-only",
                self.path.display()
            )));
        }
        self.file
            .write_all(bytes)
            .map_err(|e| GuardError::OperationFailed(format!("{}: {}", self.path.display(), e)))
    }

    /// Current file length in bytes
    pub fn len(&self) -> GuardResult<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| GuardError::OperationFailed(format!("{}: {}", self.path.display(), e)))
    }

    pub fn is_empty(&self) -> GuardResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Resource for FileResource {
    fn resource_type(&self) -> &'static str {
        "file"
    }

    fn release(mut self) -> GuardResult<()> {
        if self.writable {
            self.file
                .flush()
                .and_then(|_| self.file.sync_all())
                .map_err(|e| GuardError::release("file", format!("{}: {}", self.path.display(), e)))?;
        }
        // Closing happens when `file` drops here.
        Ok(())
    }
}

impl Acquire for FileResource {
    type Config = FileConfig;

    fn acquire(config: &FileConfig) -> GuardResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(config.write && !config.append)
            .append(config.append)
            .create(config.create)
            .truncate(config.truncate)
            .open(&config.path)
            .map_err(|e| GuardError::acquisition("file", format!("{}: {}", config.path.display(), e)))?;

        Ok(Self {
            file,
            path: config.path.clone(),
            writable: config.write,
        })
    }
}

/// Lock-file acquisition parameters
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Suffix appended to the guarded file's path
    pub suffix: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            suffix: ".lock".to_string(),
        }
    }
}

/// Sidecar lock file marking exclusive ownership of a file
///
/// Created with `create_new`, so a second holder fails to acquire.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    /// Get the lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileLock {
    fn resource_type(&self) -> &'static str {
        "file_lock"
    }

    fn release(self) -> GuardResult<()> {
        fs::remove_file(&self.path)
            .map_err(|e| GuardError::release("file_lock", format!("{}: {}", self.path.display(), e)))
    }
}

impl Layer<FileResource> for FileLock {
    type LayerConfig = LockConfig;

    fn acquire_on(base: &mut FileResource, config: &LockConfig) -> GuardResult<Self> {
        let mut path = base.path().as_os_str().to_owned();
        path.push(&config.suffix);
        let path = PathBuf::from(path);

        let mut lock = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| GuardError::acquisition("file_lock", format!("{}: {}", path.display(), e)))?;
        // The lock holds even if the owner pid cannot be recorded.
        if let Err(e) = writeln!(lock, "{}", std::process::id()) {
            debug!(path = %path.display(), error = %e, "could not record lock owner");
        }

        Ok(Self { path })
    }
}

/// File held exclusively through a lock file
pub type LockedFile = Chained<FileResource, FileLock>;

/// Guard over a plain file
pub type FileGuard = LifecycleGuard<FileResource>;

/// Guard over a locked file
pub type LockedFileGuard = LifecycleGuard<LockedFile>;
