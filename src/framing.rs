//! Incremental reassembly of terminator-delimited device messages
//!
//! The manikin streams free-form ASCII lines terminated by `\n` or ETX; no
//! structured reply grammar is defined. Reads arrive in arbitrary chunks, so
//! the undecoded tail is carried between iterations. Buffering happens at the
//! byte level: a multi-byte UTF-8 character split across two chunks stays
//! intact in the carry-over until its terminator arrives.

/// Start-of-frame marker on the host->device wire
pub const STX: u8 = 0x02;

/// End-of-frame marker; also accepted as a device->host message terminator
pub const ETX: u8 = 0x03;

/// Splits a raw incoming byte stream into discrete terminated messages
#[derive(Debug, Clone, Default)]
pub struct FrameReassembler {
    pending: Vec<u8>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every message completed by it
    ///
    /// `\n` and ETX are equivalent end-of-message markers. Completed segments
    /// are trimmed; empty segments are dropped. Whatever follows the last
    /// terminator becomes the new carry-over. Decoding is lossy so a corrupt
    /// byte inside one message cannot poison the rest of the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self
            .pending
            .iter()
            .position(|&b| b == b'\n' || b == ETX)
        {
            let segment: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&segment[..segment.len() - 1]);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                messages.push(trimmed.to_string());
            }
        }

        messages
    }

    /// The pending, possibly-incomplete tail
    pub fn carry_over(&self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }

    /// Drop any pending tail
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
