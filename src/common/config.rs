//! Port configuration for the serial bridge

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parity setting for the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Serial port options
///
/// Defaults match the manikin firmware: 9600 baud, 8 data bits, 1 stop bit,
/// no parity. The read timeout bounds each blocking read so cancellation is
/// observed within one read-loop iteration; it is not a message timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortOptions {
    /// Explicit port path (e.g. "/dev/ttyUSB0"); None lets the connector
    /// resolve one
    pub port_name: Option<String>,

    /// Line speed in baud
    pub baud_rate: u32,

    /// Data bits per character (5-8)
    pub data_bits: u8,

    /// Stop bits (1 or 2)
    pub stop_bits: u8,

    /// Parity setting
    pub parity: Parity,

    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
}

impl Default for PortOptions {
    fn default() -> Self {
        Self {
            port_name: None,
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            read_timeout: Duration::from_millis(500),
        }
    }
}

impl PortOptions {
    /// Create options for a specific port with default line settings
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: Some(port_name.into()),
            ..Default::default()
        }
    }

    /// Set the port path
    pub fn with_port_name(mut self, port_name: impl Into<String>) -> Self {
        self.port_name = Some(port_name.into());
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set data bits
    pub fn with_data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    /// Set stop bits
    pub fn with_stop_bits(mut self, stop_bits: u8) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set parity
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the blocking-read upper bound
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.baud_rate == 0 {
            return Err("Baud rate must be greater than 0".to_string());
        }

        if !(5..=8).contains(&self.data_bits) {
            return Err(format!("Unsupported data bits: {}", self.data_bits));
        }

        if !(1..=2).contains(&self.stop_bits) {
            return Err(format!("Unsupported stop bits: {}", self.stop_bits));
        }

        if self.read_timeout.is_zero() {
            return Err("Read timeout must be bounded and non-zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_manikin_firmware() {
        let options = PortOptions::default();
        assert_eq!(options.baud_rate, 9600);
        assert_eq!(options.data_bits, 8);
        assert_eq!(options.stop_bits, 1);
        assert_eq!(options.parity, Parity::None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let options = PortOptions::new("/dev/ttyACM0")
            .with_baud_rate(115200)
            .with_read_timeout(Duration::from_millis(100));
        assert_eq!(options.port_name.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(options.baud_rate, 115200);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_line_settings() {
        assert!(PortOptions::default().with_baud_rate(0).validate().is_err());
        assert!(PortOptions::default().with_data_bits(4).validate().is_err());
        assert!(PortOptions::default().with_stop_bits(3).validate().is_err());
        assert!(PortOptions::default()
            .with_read_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
