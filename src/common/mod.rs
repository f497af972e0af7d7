//! Common types shared across the bridge

pub mod config;
pub mod error;
pub mod log;

pub use config::{Parity, PortOptions};
pub use error::{BridgeError, BridgeResult};
pub use log::{epoch_ms, DiagnosticsLog, LogEntry, LOG_CAPACITY};

/// Lowercase space-separated hex rendering of a byte slice
///
/// Used for the diagnostics log and the formatting boundary's `hex` field.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_is_lowercase_space_separated() {
        assert_eq!(hex_dump(&[0x02, b'S', 0x03, 0xAB]), "02 53 03 ab");
        assert_eq!(hex_dump(&[]), "");
    }
}
