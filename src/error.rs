use crate::persist::PersistError;
use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// The migrated settings could not be written back. The device keeps
    /// running on the in-memory copy.
    PersistenceUnavailable(PersistError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PersistenceUnavailable(e) => {
                write!(f, "persistence unavailable: {}", e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::PersistenceUnavailable(e) => Some(e),
        }
    }
}

impl From<PersistError> for ConfigError {
    fn from(e: PersistError) -> Self {
        ConfigError::PersistenceUnavailable(e)
    }
}
