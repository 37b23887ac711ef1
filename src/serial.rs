//! Seam to the UART driver.

use crate::syscfg::UartSettings;
use log::info;

/// (Re)initialize the serial port from the given line settings.
pub trait SerialPort {
    fn initialize(&mut self, settings: &UartSettings);
}

/// Host stand-in for the UART driver: records and logs what it was given.
#[derive(Debug, Default)]
pub struct LogSerial {
    pub active: Option<UartSettings>,
}

impl SerialPort for LogSerial {
    fn initialize(&mut self, settings: &UartSettings) {
        info!("UART initialized: {}", settings);
        self.active = Some(*settings);
    }
}
