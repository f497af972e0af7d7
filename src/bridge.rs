// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serial bridge: connection state machine, read loop, and send paths
//!
//! Exactly one logical connection is modeled. The bridge owns the active
//! reader/writer handles and the current [`ConnectionState`]; no other
//! component reads or mutates them directly. Overlapping `send_command`
//! callers race on the single writer and must self-serialize; byte ordering
//! on the wire is otherwise unspecified.

use crate::command::{self, Command, FormattedCommand};
use crate::common::{epoch_ms, hex_dump, BridgeError, BridgeResult, DiagnosticsLog, PortOptions};
use crate::format::{format_command, CommandRequest, CommandResponse};
use crate::framing::FrameReassembler;
use crate::traits::{SerialConnector, SerialReader, SerialWriter};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Connection lifecycle state
///
/// `Unsupported` is terminal: no connect is ever attempted. All error paths
/// land back in `Disconnected`; there is no in-between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Unsupported,
    Disconnected,
    Connecting,
    Connected,
}

/// Structured result of a connect attempt
///
/// Connect never propagates an error past this boundary; failures come back
/// as `success: false` with a user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOutcome {
    pub success: bool,
    pub message: String,
}

impl ConnectOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Read-only projection of bridge state for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub connected: bool,
    pub port_name: Option<String>,
    pub last_response: Option<String>,
    /// Unix epoch milliseconds of the last send or receive
    pub last_command_time: Option<u64>,
}

#[derive(Debug, Default)]
struct StatusFields {
    port_name: Option<String>,
    last_response: Option<String>,
    last_command_time: Option<u64>,
}

type WriterSlot = Arc<Mutex<Option<Box<dyn SerialWriter>>>>;

/// Transport manager for the single manikin connection
///
/// Composes the command encoder and frame reassembler over an injected
/// [`SerialConnector`]. Commands can be sent in "rehearsal mode" while
/// disconnected: they are encoded and logged but never written, so the rest
/// of the application can exercise command flow without hardware attached.
pub struct SerialBridge {
    connector: Arc<dyn SerialConnector>,
    state: Arc<RwLock<ConnectionState>>,
    writer: WriterSlot,
    read_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
    status: Arc<RwLock<StatusFields>>,
    log: DiagnosticsLog,
}

impl SerialBridge {
    /// Create a bridge over the given connector
    ///
    /// Starts `Disconnected`, or `Unsupported` (terminally) when the
    /// connector reports no serial capability.
    pub fn new(connector: Arc<dyn SerialConnector>) -> Self {
        let log = DiagnosticsLog::new();
        let initial = if connector.supported() {
            ConnectionState::Disconnected
        } else {
            log.push("serial capability unavailable in this environment");
            ConnectionState::Unsupported
        };

        Self {
            connector,
            state: Arc::new(RwLock::new(initial)),
            writer: Arc::new(Mutex::new(None)),
            read_task: Mutex::new(None),
            shutdown: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(StatusFields::default())),
            log,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Status snapshot for display
    pub fn status(&self) -> DeviceStatus {
        // State lock is taken and released before the status lock; the
        // connect path nests them in the opposite order.
        let connected = self.state() == ConnectionState::Connected;
        let status = self.status.read();
        DeviceStatus {
            connected,
            port_name: status.port_name.clone(),
            last_response: status.last_response.clone(),
            last_command_time: status.last_command_time,
        }
    }

    /// Handle to the diagnostics ring buffer
    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.log
    }

    /// Open the serial channel and start the read loop
    ///
    /// No-op success when already connecting or connected. On any failure the
    /// bridge logs, returns to `Disconnected`, and reports the failure in the
    /// outcome; nothing is thrown past this boundary.
    pub async fn connect(&self, options: PortOptions) -> ConnectOutcome {
        {
            let mut state = self.state.write();
            match *state {
                ConnectionState::Unsupported => {
                    return ConnectOutcome::failed("serial capability unavailable");
                }
                ConnectionState::Connecting | ConnectionState::Connected => {
                    return ConnectOutcome::ok("already connected");
                }
                ConnectionState::Disconnected => {
                    *state = ConnectionState::Connecting;
                    // Armed here, under the state lock, so a disconnect that
                    // races the rest of this attempt is seen at commit time.
                    self.shutdown.store(false, Ordering::SeqCst);
                }
            }
        }

        if let Err(message) = options.validate() {
            self.log.push(format!("connect failed: {message}"));
            *self.state.write() = ConnectionState::Disconnected;
            return ConnectOutcome::failed(message);
        }

        self.log.push("connect requested");
        let handles = {
            let connector = self.connector.clone();
            let options = options.clone();
            tokio::task::spawn_blocking(move || connector.open(&options)).await
        };

        let handles = match handles {
            Ok(Ok(handles)) => handles,
            Ok(Err(BridgeError::NoPortSelected)) => {
                // User declined the chooser; logged but not surfaced as a
                // failure toast by callers.
                self.log.push("no serial port selected");
                info!("[SERIAL] no port selected, staying disconnected");
                *self.state.write() = ConnectionState::Disconnected;
                return ConnectOutcome::failed("no serial port selected");
            }
            Ok(Err(err)) => {
                self.log.push(format!("connect failed: {err}"));
                warn!("[SERIAL] connect failed: {err}");
                *self.state.write() = ConnectionState::Disconnected;
                return ConnectOutcome::failed(err.to_string());
            }
            Err(join_err) => {
                self.log.push(format!("connect failed: {join_err}"));
                *self.state.write() = ConnectionState::Disconnected;
                return ConnectOutcome::failed(join_err.to_string());
            }
        };

        let port_name = handles.port_name.clone();
        let mut state = self.state.write();
        if self.shutdown.load(Ordering::SeqCst) {
            // A disconnect arrived while the open was in flight: release the
            // freshly acquired handles instead of committing to Connected.
            *state = ConnectionState::Disconnected;
            drop(state);
            let mut writer = handles.writer;
            if let Err(err) = writer.close() {
                self.log.push(format!("writer close failed: {err}"));
            }
            self.log.push("connect cancelled by disconnect");
            info!("[SERIAL] connect cancelled by disconnect");
            return ConnectOutcome::failed("connect cancelled");
        }

        *self.writer.lock() = Some(handles.writer);
        self.status.write().port_name = Some(port_name.clone());
        let handle = spawn_read_loop(
            handles.reader,
            self.shutdown.clone(),
            self.state.clone(),
            self.writer.clone(),
            self.status.clone(),
            self.log.clone(),
        );
        *self.read_task.lock() = Some(handle);
        *state = ConnectionState::Connected;
        drop(state);

        self.log.push(format!("connected to {port_name}"));
        info!("[SERIAL] connected to {port_name}");
        ConnectOutcome::ok(format!("connected to {port_name}"))
    }

    /// Best-effort ordered teardown
    ///
    /// Cancels the read loop and awaits its exit, then releases the reader,
    /// closes the writer, and closes the channel. Every step runs even if a
    /// prior one failed; failures are logged, never propagated. Always ends
    /// `Disconnected`. No-op when not connected. Invoked while a connect is
    /// still in flight, it marks the attempt cancelled: the connect releases
    /// its handles at commit time and reports a failed outcome.
    pub async fn disconnect(&self) {
        match self.state() {
            ConnectionState::Disconnected | ConnectionState::Unsupported => return,
            _ => {}
        }

        // Step 1: signal cancellation and await read-loop exit. The reader
        // is owned by the loop, so its exit also releases the reader (step 2).
        self.shutdown.store(true, Ordering::SeqCst);
        let handle = self.read_task.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                self.log.push(format!("read task did not exit cleanly: {err}"));
                warn!("[SERIAL] read task join error: {err}");
            }
        }

        // Step 3: close the writer.
        let writer = self.writer.lock().take();
        if let Some(mut writer) = writer {
            if let Err(err) = writer.close() {
                self.log.push(format!("writer close failed: {err}"));
                warn!("[SERIAL] writer close failed: {err}");
            }
        }

        // Step 4: the channel itself closes when both halves are dropped.
        self.status.write().port_name = None;
        *self.state.write() = ConnectionState::Disconnected;
        self.log.push("disconnected");
        info!("[SERIAL] disconnected");
    }

    /// Write raw bytes through the held writer
    ///
    /// Requires `Connected`; fails immediately otherwise. Performs exactly
    /// one write and no internal queueing.
    pub fn send(&self, bytes: &[u8]) -> BridgeResult<()> {
        if self.state() != ConnectionState::Connected {
            return Err(BridgeError::NotConnected);
        }

        let mut writer = self.writer.lock();
        let writer = writer.as_mut().ok_or(BridgeError::NotConnected)?;
        writer.write_all(bytes).map_err(|err| {
            self.log.push(format!("write failed: {err}"));
            BridgeError::Io(err)
        })?;

        let dump = hex_dump(bytes);
        self.log.push(format!("sent: {dump}"));
        debug!("[SERIAL] sent: {dump}");
        self.status.write().last_command_time = Some(epoch_ms());
        Ok(())
    }

    /// Encode and send a semantic command
    ///
    /// While disconnected this logs a simulated hex dump and still succeeds,
    /// so command flow can be rehearsed without hardware.
    pub fn send_command(&self, command: &Command) -> BridgeResult<FormattedCommand> {
        let formatted = command::encode(command);
        self.dispatch(&formatted)?;
        Ok(formatted)
    }

    /// Format a loosely-typed request through the formatting boundary, then
    /// send it
    ///
    /// A formatting rejection aborts only this invocation; the connection is
    /// untouched.
    pub fn send_request(&self, request: &CommandRequest) -> BridgeResult<CommandResponse> {
        let response = format_command(request)?;
        self.dispatch(&response.command)?;
        Ok(response)
    }

    fn dispatch(&self, formatted: &FormattedCommand) -> BridgeResult<()> {
        self.log.push(formatted.description.clone());
        if self.state() == ConnectionState::Connected {
            self.send(&formatted.bytes)
        } else {
            let dump = hex_dump(&formatted.bytes);
            self.log.push(format!("simulated send: {dump}"));
            debug!("[SERIAL] simulated send: {dump}");
            Ok(())
        }
    }
}

/// Spawn the cancellable background read loop
///
/// Reads are blocking with a bounded timeout, so the loop runs on the
/// blocking pool and polls the shutdown flag between reads. `abort()` is
/// deliberately not used: a blocking serial read is not abort-safe.
fn spawn_read_loop(
    mut reader: Box<dyn SerialReader>,
    shutdown: Arc<AtomicBool>,
    state: Arc<RwLock<ConnectionState>>,
    writer: WriterSlot,
    status: Arc<RwLock<StatusFields>>,
    log: DiagnosticsLog,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut reassembler = FrameReassembler::new();
        let mut buf = [0u8; 256];

        loop {
            if shutdown.load(Ordering::SeqCst) {
                // Explicit cancellation: exit silently.
                return;
            }

            match reader.read_chunk(&mut buf) {
                Ok(0) => {
                    log.push("device closed the stream");
                    warn!("[SERIAL] device closed the stream");
                    teardown_after_stream_loss(&state, &writer, &status, &log);
                    return;
                }
                Ok(n) => {
                    for message in reassembler.feed(&buf[..n]) {
                        debug!("[SERIAL] received: {message}");
                        log.push(format!("received: {message}"));
                        let mut status = status.write();
                        status.last_response = Some(message);
                        status.last_command_time = Some(epoch_ms());
                    }
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(err) => {
                    if shutdown.load(Ordering::SeqCst) {
                        return;
                    }
                    log.push(format!("read error: {err}"));
                    warn!("[SERIAL] read error: {err}");
                    teardown_after_stream_loss(&state, &writer, &status, &log);
                    return;
                }
            }
        }
    })
}

/// Stream loss detected from inside the read loop: drop the writer too, so
/// `Disconnected` never coexists with a held handle.
fn teardown_after_stream_loss(
    state: &Arc<RwLock<ConnectionState>>,
    writer: &WriterSlot,
    status: &Arc<RwLock<StatusFields>>,
    log: &DiagnosticsLog,
) {
    let held = writer.lock().take();
    if let Some(mut held) = held {
        if let Err(err) = held.close() {
            log.push(format!("writer close failed: {err}"));
        }
    }
    status.write().port_name = None;
    *state.write() = ConnectionState::Disconnected;
}
