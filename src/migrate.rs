//! Version-gated upgrades of the stored system configuration.

use crate::syscfg::{AccessPassword, BaudRate, Parity, PasswordLock, StopBits, SystemConfig};
use log::{debug, info, warn};

/// Schema version written by this firmware.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One upgrade step. Fires only for records below `target_version`.
pub struct MigrationStep {
    pub target_version: u32,
    pub description: &'static str,
    pub apply: fn(&mut SystemConfig),
}

/// Known steps, ascending by target version. New steps go at the end.
pub static MIGRATIONS: &[MigrationStep] = &[MigrationStep {
    target_version: 1,
    description: "clear access password",
    apply: |cfg| cfg.clear_password(),
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub steps_applied: usize,
}

impl MigrationReport {
    /// True when the record changed and must be written back.
    pub fn needs_commit(&self) -> bool {
        self.steps_applied > 0
    }
}

/// Bring `config` up to [`CURRENT_SCHEMA_VERSION`].
///
/// Each step stamps its own target version after running, so an interrupted
/// upgrade leaves the record at the last completed version. A record newer
/// than this firmware is left alone; the version is never lowered.
pub fn apply_migrations(config: &mut SystemConfig) -> MigrationReport {
    let from_version = config.config_version;
    let mut steps_applied = 0;

    for step in MIGRATIONS {
        if config.config_version < step.target_version {
            info!(
                "Upgrading syscfg to v{} ({})",
                step.target_version, step.description
            );
            (step.apply)(config);
            config.config_version = step.target_version;
            steps_applied += 1;
        }
    }

    if config.config_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "syscfg v{} is newer than this firmware (v{}), keeping it",
            config.config_version, CURRENT_SCHEMA_VERSION
        );
    } else {
        config.config_version = CURRENT_SCHEMA_VERSION;
    }

    debug!(
        "syscfg migration: v{} -> v{}, {} step(s)",
        from_version, config.config_version, steps_applied
    );

    MigrationReport {
        from_version,
        to_version: config.config_version,
        steps_applied,
    }
}

/// Overwrite every field with the factory values. Does not commit.
pub fn reset_to_factory_defaults(config: &mut SystemConfig) {
    config.set_parity(Parity::None);
    config.set_baudrate(BaudRate::B115200);
    config.set_stopbits(StopBits::One);
    config.config_version = CURRENT_SCHEMA_VERSION;
    config.access_pw = AccessPassword::empty();
    config.set_pwlock(PasswordLock::None);
}
