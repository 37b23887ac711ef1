//! Namespaced blob storage, modelled on the NVS `get_blob`/`set_blob` API.

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// NVS limits namespace and key names to 15 characters.
pub const MAX_NAME_LEN: usize = 15;

#[derive(Debug)]
pub enum StorageError {
    InvalidName(String),
    Io(io::Error),
    WriteRejected,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidName(name) => write!(f, "invalid namespace or key '{}'", name),
            StorageError::Io(e) => write!(f, "storage I/O error: {}", e),
            StorageError::WriteRejected => write!(f, "storage rejected the write"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

pub trait BlobBackend {
    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set_blob(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
    /// Returns whether the key existed.
    fn remove(&mut self, namespace: &str, key: &str) -> Result<bool, StorageError>;
}

/// RAM-only backend. `fail_writes` makes every write fail, which is how a
/// worn-out or write-protected flash looks to the caller.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    blobs: HashMap<(String, String), Vec<u8>>,
    pub fail_writes: bool,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_blob` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl BlobBackend for MemoryBackend {
    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_name(namespace)?;
        validate_name(key)?;
        Ok(self
            .blobs
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn set_blob(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_name(namespace)?;
        validate_name(key)?;
        if self.fail_writes {
            return Err(StorageError::WriteRejected);
        }
        self.blobs
            .insert((namespace.to_string(), key.to_string()), data.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        validate_name(namespace)?;
        validate_name(key)?;
        Ok(self
            .blobs
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }
}

/// Directory-backed store: `<root>/<namespace>/<key>.bin`.
///
/// Writes go to a temp file that is renamed over the target, so a reader
/// sees either the old blob or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, namespace: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_name(namespace)?;
        validate_name(key)?;
        Ok(self.root.join(namespace).join(format!("{}.bin", key)))
    }
}

impl BlobBackend for DirBackend {
    fn get_blob(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.blob_path(namespace, key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_blob(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.blob_path(namespace, key)?;
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir)?;

        let tmp = dir.join(format!("{}.tmp", key));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(namespace, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
