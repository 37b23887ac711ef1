use crate::boot::apply_settings;
use crate::error::ConfigError;
use crate::migrate::CURRENT_SCHEMA_VERSION;
use crate::persist::{ConfigStore, Persist};
use crate::serial::LogSerial;
use crate::storage::{BlobBackend, DirBackend, MemoryBackend};
use crate::syscfg::{BaudRate, Parity, PasswordLock, StopBits, SystemConfig, UartSettings};

#[test]
fn test_first_boot_migrates_and_persists_once() {
    let mut store = Persist::load(MemoryBackend::new());
    let mut serial = LogSerial::default();

    let report = apply_settings(&mut store, &mut serial).unwrap();

    assert_eq!(report.from_version, 0);
    assert_eq!(store.backend().write_count(), 1);
    assert_eq!(store.current().config_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(serial.active, Some(UartSettings::default()));

    let mut reloaded = Persist::load(store.into_backend());
    let report = apply_settings(&mut reloaded, &mut serial).unwrap();
    assert!(!report.needs_commit());
    assert_eq!(reloaded.backend().write_count(), 1);
    // Stored line settings are the factory 115200 8N1, not blank flash codes
    assert_eq!(reloaded.current().baudrate(), Some(BaudRate::B115200));
    assert_eq!(reloaded.current().parity(), Some(Parity::None));
    assert_eq!(reloaded.current().stopbits(), Some(StopBits::One));
    assert_eq!(UartSettings::from_config(reloaded.current()), UartSettings::default());
    assert_eq!(reloaded.defaults(), &SystemConfig::default());
}

#[test]
fn test_garbage_blob_is_replaced_on_boot() {
    let mut backend = MemoryBackend::new();
    backend.set_blob("espterm", "persist", b"garbage").unwrap();
    let mut store = Persist::load(backend);

    let report = apply_settings(&mut store, &mut LogSerial::default()).unwrap();
    assert!(!report.needs_commit());

    let stored = store.backend().get_blob("espterm", "persist").unwrap().unwrap();
    assert_ne!(stored, b"garbage".to_vec());
    assert_eq!(store.backend().write_count(), 2);

    let reloaded = Persist::load(store.into_backend());
    assert!(!reloaded.needs_commit());
    assert_eq!(reloaded.current(), &SystemConfig::default());
    assert_eq!(reloaded.defaults(), &SystemConfig::default());
}

#[test]
fn test_corrupt_file_is_rewritten_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = DirBackend::new(dir.path());
    backend.set_blob("espterm", "persist", b"{\"current\":").unwrap();

    let mut store = Persist::load(DirBackend::new(dir.path()));
    apply_settings(&mut store, &mut LogSerial::default()).unwrap();

    let mut rebooted = Persist::load(DirBackend::new(dir.path()));
    assert!(!rebooted.needs_commit());
    assert_eq!(rebooted.current(), &SystemConfig::default());
    let report = apply_settings(&mut rebooted, &mut LogSerial::default()).unwrap();
    assert!(!report.needs_commit());
}

#[test]
fn test_legacy_locked_record_is_unlocked_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let mut legacy = Persist::load(DirBackend::new(dir.path()));
    legacy.restore_hard_default();
    legacy
        .current_record()
        .set_password("secret", PasswordLock::All)
        .unwrap();
    legacy.current_record().config_version = 0;
    legacy.commit().unwrap();

    let mut store = Persist::load(DirBackend::new(dir.path()));
    apply_settings(&mut store, &mut LogSerial::default()).unwrap();

    let on_disk = Persist::load(DirBackend::new(dir.path()));
    assert!(on_disk.current().access_pw.is_empty());
    assert_eq!(on_disk.current().pwlock(), Some(PasswordLock::None));
    assert_eq!(on_disk.current().config_version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_write_protected_flash_boots_degraded() {
    let mut backend = MemoryBackend::new();
    backend.fail_writes = true;
    let mut store = Persist::load(backend);
    let mut serial = LogSerial::default();

    let result = apply_settings(&mut store, &mut serial);

    assert!(matches!(result, Err(ConfigError::PersistenceUnavailable(_))));
    assert!(serial.active.is_some());
    assert_eq!(store.current().config_version, CURRENT_SCHEMA_VERSION);
    assert_ne!(store.current(), &SystemConfig::zeroed());
}
