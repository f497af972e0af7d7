// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serial capability traits
//!
//! The bridge never binds to a concrete serial driver. It is handed a
//! [`SerialConnector`] and works purely through the reader/writer pair the
//! connector opens, so the full connection lifecycle can be exercised against
//! an in-process fake without hardware attached.

use crate::common::{BridgeResult, PortOptions};
use std::io;

/// Exclusive read half of an open serial channel
///
/// `read_chunk` blocks for at most the configured read timeout and returns
/// `io::ErrorKind::TimedOut` (or `WouldBlock`) when no data arrived. The
/// bounded wait is what lets the read loop observe cancellation within one
/// iteration.
pub trait SerialReader: Send {
    /// Read the next available chunk; `Ok(0)` signals end-of-stream
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Exclusive write half of an open serial channel
pub trait SerialWriter: Send {
    /// Perform exactly one write of the full byte sequence
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flush and release the writer
    fn close(&mut self) -> io::Result<()>;
}

/// The reader/writer pair for one open channel
///
/// A connector hands out exactly one of each per open; the bridge enforces
/// that no second pair is acquired while one is held.
pub struct SerialHandles {
    pub reader: Box<dyn SerialReader>,
    pub writer: Box<dyn SerialWriter>,
    /// Resolved port identity, for status reporting
    pub port_name: String,
}

/// Injected serial capability
pub trait SerialConnector: Send + Sync {
    /// Whether this environment can open serial channels at all
    fn supported(&self) -> bool {
        true
    }

    /// Open the channel described by `options`, acquiring its reader and
    /// writer
    fn open(&self, options: &PortOptions) -> BridgeResult<SerialHandles>;
}

/// Connector for environments without any serial capability
///
/// A bridge built over this connector starts in the terminal `Unsupported`
/// state and never attempts a connect.
pub struct UnsupportedConnector;

impl SerialConnector for UnsupportedConnector {
    fn supported(&self) -> bool {
        false
    }

    fn open(&self, _options: &PortOptions) -> BridgeResult<SerialHandles> {
        Err(crate::common::BridgeError::Unsupported)
    }
}
