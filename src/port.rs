//! Hardware serial backend over the `serialport` crate
//!
//! Only compiled with the `serialport` feature. The reader and writer are
//! two handles onto the same OS port (`try_clone`), which is what gives the
//! bridge its independent exclusive halves.

use crate::common::{BridgeError, BridgeResult, Parity, PortOptions};
use crate::traits::{SerialConnector, SerialHandles, SerialReader, SerialWriter};
use serialport::{DataBits, SerialPort, StopBits};
use std::io::{self, Read, Write};
use tracing::debug;

/// Connector that opens real system serial ports
#[derive(Debug, Default)]
pub struct SystemPortConnector;

impl SystemPortConnector {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the port to open: an explicit name wins, otherwise the first
    /// enumerated port. No ports at all maps to the selection failure class.
    fn resolve_port(&self, options: &PortOptions) -> BridgeResult<String> {
        if let Some(name) = &options.port_name {
            return Ok(name.clone());
        }

        let ports = serialport::available_ports()
            .map_err(|e| BridgeError::OpenFailed(e.to_string()))?;
        ports
            .into_iter()
            .next()
            .map(|p| p.port_name)
            .ok_or(BridgeError::NoPortSelected)
    }
}

impl SerialConnector for SystemPortConnector {
    fn open(&self, options: &PortOptions) -> BridgeResult<SerialHandles> {
        options.validate().map_err(BridgeError::InvalidConfig)?;
        let port_name = self.resolve_port(options)?;

        let data_bits = match options.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        let stop_bits = match options.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };
        let parity = match options.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };

        debug!(
            "[SERIAL] opening {port_name} at {} baud ({:?}/{:?}/{:?})",
            options.baud_rate, data_bits, stop_bits, parity
        );

        let reader = serialport::new(&port_name, options.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .timeout(options.read_timeout)
            .open()
            .map_err(|e| BridgeError::OpenFailed(e.to_string()))?;

        let writer = reader
            .try_clone()
            .map_err(|e| BridgeError::OpenFailed(e.to_string()))?;

        Ok(SerialHandles {
            reader: Box::new(PortReader { port: reader }),
            writer: Box::new(PortWriter { port: writer }),
            port_name,
        })
    }
}

struct PortReader {
    port: Box<dyn SerialPort>,
}

impl SerialReader for PortReader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

struct PortWriter {
    port: Box<dyn SerialPort>,
}

impl SerialWriter for PortWriter {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle closes the OS port; flush whatever is pending.
        self.port.flush()
    }
}
