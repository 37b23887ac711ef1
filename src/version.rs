// Centralized version information

// Firmware release this settings layout ships with
pub const FIRMWARE_VERSION: &str = "v2.2-rust";

// Cargo package version from Cargo.toml
pub const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

// Full version string including Cargo version and settings schema
pub fn full_version() -> String {
    format!(
        "{} ({}, syscfg v{})",
        FIRMWARE_VERSION,
        CARGO_VERSION,
        crate::migrate::CURRENT_SCHEMA_VERSION
    )
}
