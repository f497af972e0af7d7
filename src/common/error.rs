//! Common error types for the serial bridge

use crate::format::FormatServiceError;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge-wide error taxonomy
///
/// Capability and selection failures are terminal for the attempt that hit
/// them and are never retried internally; a fresh `connect()` is required
/// after any open or I/O failure.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Serial capability is absent in this environment
    #[error("Serial capability unavailable on this host")]
    Unsupported,

    /// No port was selected and none could be resolved
    #[error("No serial port selected")]
    NoPortSelected,

    /// Device open/configure failed
    #[error("Failed to open serial port: {0}")]
    OpenFailed(String),

    /// Operation requires an active connection
    #[error("Bridge is not connected")]
    NotConnected,

    /// Read or write failure mid-session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid port options
    #[error("Invalid port options: {0}")]
    InvalidConfig(String),

    /// The command-formatting boundary rejected or failed to process a command
    #[error(transparent)]
    Format(#[from] FormatServiceError),
}

impl BridgeError {
    /// True for failures that only abort the single invocation and leave the
    /// connection untouched.
    pub fn is_connection_preserving(&self) -> bool {
        matches!(self, Self::Format(_) | Self::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors_preserve_the_connection() {
        let err = BridgeError::Format(FormatServiceError::MissingAction);
        assert!(err.is_connection_preserving());
        assert!(!BridgeError::Unsupported.is_connection_preserving());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
