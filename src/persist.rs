//! Persistent settings blob holding the live config and the user defaults.

use crate::migrate::{apply_migrations, reset_to_factory_defaults, MigrationReport};
use crate::storage::{BlobBackend, StorageError};
use crate::syscfg::SystemConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const PERSIST_NS: &str = "espterm";
const PERSIST_KEY: &str = "persist";

#[derive(Debug)]
pub enum PersistError {
    Backend(StorageError),
    Encode(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Backend(e) => write!(f, "failed to write settings: {}", e),
            PersistError::Encode(e) => write!(f, "failed to encode settings: {}", e),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Backend(e) => Some(e),
            PersistError::Encode(e) => Some(e),
        }
    }
}

impl From<StorageError> for PersistError {
    fn from(e: StorageError) -> Self {
        PersistError::Backend(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Encode(e)
    }
}

/// Owner of the live configuration record.
///
/// Callers must hold exclusive access for the duration of a migration or
/// reset; `&mut self` on every accessor enforces that.
pub trait ConfigStore {
    fn current_record(&mut self) -> &mut SystemConfig;
    /// Durably write the in-memory record.
    fn commit(&mut self) -> Result<(), PersistError>;
    /// True when the in-memory record was replaced at load time and the
    /// stored copy is stale, independent of any migration.
    fn needs_commit(&self) -> bool {
        false
    }
}

#[derive(Serialize)]
struct Slots<'a> {
    current: &'a SystemConfig,
    defaults: &'a SystemConfig,
}

#[derive(Serialize, Deserialize)]
struct PersistedBlob {
    current: SystemConfig,
    defaults: SystemConfig,
    checksum: String,
}

fn checksum(
    current: &SystemConfig,
    defaults: &SystemConfig,
) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(&Slots { current, defaults })?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

/// Why a stored blob could not be used.
#[derive(Debug)]
enum LoadFailure {
    Parse(serde_json::Error),
    ChecksumMismatch,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::Parse(e) => write!(f, "parse error: {}", e),
            LoadFailure::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

fn decode(data: &[u8]) -> Result<(SystemConfig, SystemConfig), LoadFailure> {
    let blob: PersistedBlob = serde_json::from_slice(data).map_err(LoadFailure::Parse)?;
    let expected = checksum(&blob.current, &blob.defaults).map_err(LoadFailure::Parse)?;
    if expected != blob.checksum {
        return Err(LoadFailure::ChecksumMismatch);
    }
    Ok((blob.current, blob.defaults))
}

pub struct Persist<B: BlobBackend> {
    backend: B,
    current: SystemConfig,
    defaults: SystemConfig,
    dirty: bool,
}

/// Blank flash: factory line settings at schema version 0, so the first
/// boot still runs every migration step and writes the result.
fn first_boot_record() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.config_version = 0;
    config
}

impl<B: BlobBackend> Persist<B> {
    /// Load settings from `backend`. Never fails: a missing blob yields a
    /// version 0 record with factory line settings, an unreadable or tampered
    /// one the factory defaults, marked for writing on the next commit check.
    pub fn load(backend: B) -> Self {
        let stored = backend.get_blob(PERSIST_NS, PERSIST_KEY);

        let (current, defaults, dirty) = match stored {
            Ok(Some(data)) => match decode(&data) {
                Ok((current, defaults)) => {
                    info!("Loaded persisted settings ({} bytes)", data.len());
                    (current, defaults, false)
                }
                Err(e) => {
                    warn!("Persisted settings unusable ({}), restoring hard defaults", e);
                    (SystemConfig::default(), SystemConfig::default(), true)
                }
            },
            Ok(None) => {
                info!("No persisted settings, starting from blank config");
                (first_boot_record(), SystemConfig::default(), false)
            }
            Err(e) => {
                warn!("Failed to read persisted settings: {}, restoring hard defaults", e);
                (SystemConfig::default(), SystemConfig::default(), true)
            }
        };

        Self {
            backend,
            current,
            defaults,
            dirty,
        }
    }

    pub fn current(&self) -> &SystemConfig {
        &self.current
    }

    pub fn defaults(&self) -> &SystemConfig {
        &self.defaults
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Save the current settings as the user defaults and write them out.
    /// The current record is brought to the current schema first.
    pub fn set_as_default(&mut self) -> Result<(), PersistError> {
        apply_migrations(&mut self.current);
        self.defaults = self.current.clone();
        info!("Current settings saved as defaults");
        self.commit()
    }

    /// Copy the user defaults over the current settings and upgrade them to
    /// the current schema. Does not commit.
    pub fn restore_default(&mut self) -> MigrationReport {
        self.current = self.defaults.clone();
        info!("Restored settings from saved defaults");
        apply_migrations(&mut self.current)
    }

    /// Factory-reset both slots. Does not commit.
    pub fn restore_hard_default(&mut self) {
        reset_to_factory_defaults(&mut self.current);
        reset_to_factory_defaults(&mut self.defaults);
        info!("Restored hard defaults");
    }
}

impl<B: BlobBackend> ConfigStore for Persist<B> {
    fn current_record(&mut self) -> &mut SystemConfig {
        &mut self.current
    }

    fn commit(&mut self) -> Result<(), PersistError> {
        let blob = PersistedBlob {
            checksum: checksum(&self.current, &self.defaults)?,
            current: self.current.clone(),
            defaults: self.defaults.clone(),
        };
        let data = serde_json::to_vec(&blob)?;
        self.backend.set_blob(PERSIST_NS, PERSIST_KEY, &data)?;
        self.dirty = false;
        info!("Settings persisted ({} bytes)", data.len());
        Ok(())
    }

    fn needs_commit(&self) -> bool {
        self.dirty
    }
}
