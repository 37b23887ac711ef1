//! ESPTerm system settings - hardware-independent logic
//!
//! Schema migration and factory reset for the persisted system configuration,
//! plus the persistence blob and boot sequence around them. Everything here
//! runs on the host; flash and UART are reached through the `BlobBackend`
//! and `SerialPort` traits.

pub mod boot;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod persist;
pub mod serial;
pub mod storage;
pub mod syscfg;
pub mod version;

#[cfg(test)]
mod tests;

pub use boot::{apply_settings, factory_reset};
pub use error::ConfigError;
pub use migrate::{
    apply_migrations, reset_to_factory_defaults, MigrationReport, CURRENT_SCHEMA_VERSION,
};
pub use persist::{ConfigStore, Persist, PersistError};
pub use serial::SerialPort;
pub use syscfg::SystemConfig;
