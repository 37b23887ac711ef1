//! Boot-time settings sequence: migrate, persist if changed, bring up the UART.

use crate::error::ConfigError;
use crate::migrate::{apply_migrations, reset_to_factory_defaults, MigrationReport};
use crate::persist::ConfigStore;
use crate::serial::SerialPort;
use crate::syscfg::UartSettings;
use log::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootStage {
    Migrate,
    Persist,
    SerialInit,
    Complete,
}

impl BootStage {
    pub fn description(&self) -> &'static str {
        match self {
            BootStage::Migrate => "Upgrading settings",
            BootStage::Persist => "Saving settings",
            BootStage::SerialInit => "Initializing UART",
            BootStage::Complete => "Ready",
        }
    }
}

/// Apply stored settings at boot.
///
/// The record is written back when a migration step ran or the store
/// replaced an unusable copy at load time. The serial port is initialized
/// after migration in every case, including when the commit fails; the
/// commit error is returned afterwards so the caller can decide how to run
/// degraded.
pub fn apply_settings<S, P>(
    store: &mut S,
    serial: &mut P,
) -> Result<MigrationReport, ConfigError>
where
    S: ConfigStore + ?Sized,
    P: SerialPort + ?Sized,
{
    info!("{}", BootStage::Migrate.description());
    let report = apply_migrations(store.current_record());

    let committed = if report.needs_commit() || store.needs_commit() {
        info!("{}", BootStage::Persist.description());
        store.commit()
    } else {
        Ok(())
    };

    info!("{}", BootStage::SerialInit.description());
    serial.initialize(&UartSettings::from_config(store.current_record()));

    match committed {
        Ok(()) => {
            info!("{}", BootStage::Complete.description());
            Ok(report)
        }
        Err(e) => {
            error!("Migrated settings not persisted: {}", e);
            Err(ConfigError::PersistenceUnavailable(e))
        }
    }
}

/// Factory-reset the live record and write it out.
///
/// Re-initializing peripherals is left to the reset sequence that follows.
pub fn factory_reset<S>(store: &mut S) -> Result<(), ConfigError>
where
    S: ConfigStore + ?Sized,
{
    reset_to_factory_defaults(store.current_record());
    store.commit()?;
    info!("Factory defaults restored");
    Ok(())
}
