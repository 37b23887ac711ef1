//! System configuration record: password lock and UART parameters.
//!
//! Enumerated fields are kept as raw codes, the same values the firmware
//! writes to flash, so a record read back from storage can hold codes this
//! build does not recognize. Typed accessors decode them on demand.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity of the access password buffer, terminator included.
pub const ACCESS_PW_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordLock {
    None = 0,
    SettingsNoPw = 1,
    SettingsAll = 2,
    Menus = 3,
    All = 4,
}

impl PasswordLock {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PasswordLock::None),
            1 => Some(PasswordLock::SettingsNoPw),
            2 => Some(PasswordLock::SettingsAll),
            3 => Some(PasswordLock::Menus),
            4 => Some(PasswordLock::All),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    Even = 0,
    Odd = 1,
    None = 2,
}

impl Parity {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Parity::Even),
            1 => Some(Parity::Odd),
            2 => Some(Parity::None),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 1,
    OneAndHalf = 2,
    Two = 3,
}

impl StopBits {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(StopBits::One),
            2 => Some(StopBits::OneAndHalf),
            3 => Some(StopBits::Two),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Baud rates the UART driver can be configured for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudRate(u32);

impl BaudRate {
    pub const SUPPORTED: [u32; 16] = [
        300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 74880, 115200, 230400, 460800,
        921600, 1843200, 3686400,
    ];

    pub const B115200: BaudRate = BaudRate(115200);

    pub fn new(rate: u32) -> Option<Self> {
        Self::SUPPORTED.contains(&rate).then_some(BaudRate(rate))
    }

    pub fn bps(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    TooLong { len: usize },
    ContainsNul,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::TooLong { len } => write!(
                f,
                "access password is {} bytes, at most {} allowed",
                len,
                ACCESS_PW_LEN - 1
            ),
            PasswordError::ContainsNul => write!(f, "access password cannot contain NUL bytes"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Fixed-capacity, NUL-terminated password buffer.
///
/// A leading zero byte means "no password"; clearing only writes that byte,
/// so stale bytes may remain behind the terminator exactly as they do in flash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct AccessPassword([u8; ACCESS_PW_LEN]);

impl AccessPassword {
    pub fn empty() -> Self {
        Self([0; ACCESS_PW_LEN])
    }

    pub fn new(password: &str) -> Result<Self, PasswordError> {
        let bytes = password.as_bytes();
        if bytes.contains(&0) {
            return Err(PasswordError::ContainsNul);
        }
        if bytes.len() >= ACCESS_PW_LEN {
            return Err(PasswordError::TooLong { len: bytes.len() });
        }
        let mut buf = [0; ACCESS_PW_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Password bytes up to the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(ACCESS_PW_LEN);
        &self.0[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    pub fn clear(&mut self) {
        self.0[0] = 0;
    }

    pub fn matches(&self, candidate: &str) -> bool {
        !self.is_empty() && self.as_bytes() == candidate.as_bytes()
    }
}

impl Default for AccessPassword {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AccessPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_empty() { "<empty>" } else { "<set>" })
    }
}

impl From<AccessPassword> for Vec<u8> {
    fn from(pw: AccessPassword) -> Self {
        pw.0.to_vec()
    }
}

impl TryFrom<Vec<u8>> for AccessPassword {
    type Error = String;

    fn try_from(raw: Vec<u8>) -> Result<Self, Self::Error> {
        let buf: [u8; ACCESS_PW_LEN] = raw.try_into().map_err(|v: Vec<u8>| {
            format!("access_pw must be {} bytes, got {}", ACCESS_PW_LEN, v.len())
        })?;
        Ok(Self(buf))
    }
}

/// The persisted system configuration bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub config_version: u32,
    pub access_pw: AccessPassword,
    pub pwlock: u8,
    pub uart_parity: u8,
    pub uart_baudrate: u32,
    pub uart_stopbits: u8,
}

impl SystemConfig {
    /// Blank flash: every field zero, schema version 0.
    pub fn zeroed() -> Self {
        Self {
            config_version: 0,
            access_pw: AccessPassword::empty(),
            pwlock: 0,
            uart_parity: 0,
            uart_baudrate: 0,
            uart_stopbits: 0,
        }
    }

    pub fn pwlock(&self) -> Option<PasswordLock> {
        PasswordLock::from_code(self.pwlock)
    }

    pub fn set_pwlock(&mut self, lock: PasswordLock) {
        self.pwlock = lock.code();
    }

    pub fn parity(&self) -> Option<Parity> {
        Parity::from_code(self.uart_parity)
    }

    pub fn set_parity(&mut self, parity: Parity) {
        self.uart_parity = parity.code();
    }

    pub fn baudrate(&self) -> Option<BaudRate> {
        BaudRate::new(self.uart_baudrate)
    }

    pub fn set_baudrate(&mut self, rate: BaudRate) {
        self.uart_baudrate = rate.bps();
    }

    pub fn stopbits(&self) -> Option<StopBits> {
        StopBits::from_code(self.uart_stopbits)
    }

    pub fn set_stopbits(&mut self, stopbits: StopBits) {
        self.uart_stopbits = stopbits.code();
    }

    /// Set a new access password together with the lock mode guarding it.
    pub fn set_password(
        &mut self,
        password: &str,
        lock: PasswordLock,
    ) -> Result<(), PasswordError> {
        self.access_pw = AccessPassword::new(password)?;
        self.set_pwlock(lock);
        Ok(())
    }

    pub fn clear_password(&mut self) {
        self.access_pw.clear();
        self.set_pwlock(PasswordLock::None);
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut config = Self::zeroed();
        crate::migrate::reset_to_factory_defaults(&mut config);
        config
    }
}

/// Line settings handed to the serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartSettings {
    pub baud: BaudRate,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub data_bits: u8,
}

impl Default for UartSettings {
    fn default() -> Self {
        Self {
            baud: BaudRate::B115200,
            parity: Parity::None,
            stop_bits: StopBits::One,
            data_bits: 8,
        }
    }
}

impl UartSettings {
    /// Decode the UART fields of a record, substituting the factory value
    /// for any code that is out of range.
    pub fn from_config(config: &SystemConfig) -> Self {
        let fallback = Self::default();

        let baud = config.baudrate().unwrap_or_else(|| {
            warn!("Invalid stored baud rate {}, using {}", config.uart_baudrate, fallback.baud);
            fallback.baud
        });
        let parity = config.parity().unwrap_or_else(|| {
            warn!("Invalid stored parity code {}, using {:?}", config.uart_parity, fallback.parity);
            fallback.parity
        });
        let stop_bits = config.stopbits().unwrap_or_else(|| {
            warn!(
                "Invalid stored stop bits code {}, using {:?}",
                config.uart_stopbits, fallback.stop_bits
            );
            fallback.stop_bits
        });

        Self {
            baud,
            parity,
            stop_bits,
            data_bits: fallback.data_bits,
        }
    }
}

impl fmt::Display for UartSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => "1",
            StopBits::OneAndHalf => "1.5",
            StopBits::Two => "2",
        };
        write!(f, "{} {}{}{}", self.baud, self.data_bits, parity, stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip_and_limits() {
        let pw = AccessPassword::new("secret").unwrap();
        assert_eq!(pw.as_bytes(), b"secret");
        assert!(!pw.is_empty());
        assert!(pw.matches("secret"));
        assert!(!pw.matches("Secret"));

        assert!(AccessPassword::new(&"a".repeat(63)).is_ok());
        assert_eq!(
            AccessPassword::new(&"a".repeat(64)),
            Err(PasswordError::TooLong { len: 64 })
        );
        assert_eq!(AccessPassword::new("a\0b"), Err(PasswordError::ContainsNul));
    }

    #[test]
    fn test_password_clear_writes_terminator_only() {
        let mut pw = AccessPassword::new("hunter2").unwrap();
        pw.clear();
        assert!(pw.is_empty());
        assert_eq!(pw.as_bytes(), b"");
        // Empty password never matches, not even the empty string
        assert!(!pw.matches(""));
    }

    #[test]
    fn test_password_debug_hides_secret() {
        let pw = AccessPassword::new("topsecret").unwrap();
        let shown = format!("{:?}", pw);
        assert!(!shown.contains("topsecret"));
        assert_eq!(shown, "<set>");
    }

    #[test]
    fn test_password_rejects_wrong_length_blob() {
        let short: Result<AccessPassword, _> = serde_json::from_str("[1,2,3]");
        assert!(short.is_err());
    }

    #[test]
    fn test_enum_codes() {
        assert_eq!(PasswordLock::from_code(4), Some(PasswordLock::All));
        assert_eq!(PasswordLock::from_code(5), None);
        assert_eq!(Parity::from_code(2), Some(Parity::None));
        assert_eq!(Parity::from_code(3), None);
        assert_eq!(StopBits::from_code(0), None);
        assert_eq!(StopBits::One.code(), 1);
    }

    #[test]
    fn test_baud_rate_table() {
        assert_eq!(BaudRate::new(115200), Some(BaudRate::B115200));
        assert!(BaudRate::new(74880).is_some());
        assert!(BaudRate::new(0).is_none());
        assert!(BaudRate::new(115201).is_none());
    }

    #[test]
    fn test_zeroed_record_decodes_partially() {
        let cfg = SystemConfig::zeroed();
        assert_eq!(cfg.pwlock(), Some(PasswordLock::None));
        assert_eq!(cfg.parity(), Some(Parity::Even));
        assert_eq!(cfg.baudrate(), None);
        assert_eq!(cfg.stopbits(), None);
    }

    #[test]
    fn test_uart_settings_fall_back_per_field() {
        let mut cfg = SystemConfig::zeroed();
        cfg.uart_baudrate = 9600;
        cfg.uart_parity = 0xFF;
        cfg.uart_stopbits = StopBits::Two.code();

        let settings = UartSettings::from_config(&cfg);
        assert_eq!(settings.baud.bps(), 9600);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::Two);
        assert_eq!(settings.data_bits, 8);
    }

    #[test]
    fn test_uart_settings_display() {
        assert_eq!(UartSettings::default().to_string(), "115200 bps 8N1");
    }

    #[test]
    fn test_set_password_sets_lock() {
        let mut cfg = SystemConfig::default();
        cfg.set_password("pw", PasswordLock::Menus).unwrap();
        assert_eq!(cfg.pwlock(), Some(PasswordLock::Menus));

        cfg.clear_password();
        assert!(cfg.access_pw.is_empty());
        assert_eq!(cfg.pwlock(), Some(PasswordLock::None));
    }
}
