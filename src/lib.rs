//! # soundsim-bridge
//!
//! Serial command bridge for auscultation training manikins. Turns logical
//! playback commands ("play lung sound X at location Y at volume V") into a
//! small framed binary protocol and manages the lifecycle of the single
//! serial connection that carries it.
//!
//! ## Wire protocol
//!
//! Every command is one frame: `[STX] payload [ETX] [checksum]` with
//! `STX = 0x02`, `ETX = 0x03`, and an 8-bit sum-mod-256 checksum over the
//! ASCII payload. Payload grammar:
//!
//! | Action | Payload |
//! |---|---|
//! | play | `P:<S>:<SOUNDCODE>:<LOC>:<VOL>` |
//! | stop | `S` |
//! | volume | `V:<VOL>` |
//! | status | `Q` |
//! | unrecognized | `N` |
//!
//! Device-to-host traffic is free-form ASCII terminated by `\n` or ETX; no
//! reply grammar correlates responses to sent frames.
//!
//! ## Architecture
//!
//! 1. **Common**: shared types (errors, port options, diagnostics log)
//! 2. **Protocol**: pure command encoder and incremental frame reassembler
//! 3. **Bridge**: the connection state machine composing both over an
//!    injected [`traits::SerialConnector`]
//!
//! The hardware backend ([`port::SystemPortConnector`]) is gated behind the
//! `serialport` feature; everything else runs against any connector
//! implementation, which is how the test suite exercises the full lifecycle
//! in-process.
//!
//! ## Example
//!
//! Encoding is pure and total:
//!
//! ```
//! use soundsim_bridge::command::{encode, Command, SoundSystem};
//!
//! let formatted = encode(&Command::Play {
//!     system: SoundSystem::Lung,
//!     sound_code: Some("lung_normal".into()),
//!     location: Some("right-upper-anterior".into()),
//!     volume: Some(12), // clamped to 10
//! });
//! assert_eq!(formatted.raw, "P:L:LUNG_NORMAL:RUA:10");
//! assert_eq!(formatted.bytes[0], 0x02);
//! ```
//!
//! Driving a real port (requires the `serialport` feature):
//!
//! ```no_run
//! # #[cfg(feature = "serialport")]
//! # async fn demo() {
//! use std::sync::Arc;
//! use soundsim_bridge::bridge::SerialBridge;
//! use soundsim_bridge::command::Command;
//! use soundsim_bridge::common::PortOptions;
//! use soundsim_bridge::port::SystemPortConnector;
//!
//! let bridge = SerialBridge::new(Arc::new(SystemPortConnector::new()));
//! let outcome = bridge.connect(PortOptions::default()).await;
//! assert!(outcome.success);
//!
//! bridge.send_command(&Command::Stop).unwrap();
//! bridge.disconnect().await;
//! # }
//! ```

pub mod bridge;
pub mod command;
pub mod common;
pub mod format;
pub mod framing;
pub mod traits;

#[cfg(feature = "serialport")]
pub mod port;

// Re-export commonly used types
pub use bridge::{ConnectOutcome, ConnectionState, DeviceStatus, SerialBridge};
pub use command::{encode, Command, FormattedCommand, SoundSystem};
pub use common::{
    BridgeError, BridgeResult, DiagnosticsLog, LogEntry, Parity, PortOptions, LOG_CAPACITY,
};
pub use format::{format_command, CommandRequest, CommandResponse, FormatServiceError};
pub use framing::{FrameReassembler, ETX, STX};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::*;
    pub use crate::command::*;
    pub use crate::common::*;
    pub use crate::format::*;
    pub use crate::framing::*;
    pub use crate::traits::*;

    #[cfg(feature = "serialport")]
    pub use crate::port::*;
}
