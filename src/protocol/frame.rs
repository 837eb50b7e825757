//! Inbound command framing
//!
//! Extracts `<...>` delimited frames from a client's byte stream.
//!
//! ```text
//!   Idle ──'<'──▶ Capturing ──'>'──▶ frame ready, back to Idle
//!    │               │
//!    └─ other bytes  └─ other bytes appended (at most capacity-1 kept)
//!       discarded
//! ```

use bytes::{Buf, BytesMut};

/// Frame start marker
pub const START_MARKER: u8 = b'<';

/// Frame end marker
pub const END_MARKER: u8 = b'>';

/// Default command buffer capacity
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Idle,
    Capturing,
}

/// Bytes captured between a start and an end marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
    truncated: bool,
}

impl RawFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame text, invalid UTF-8 replaced
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Whether bytes were dropped because the buffer was full
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

/// Per-connection frame extractor
#[derive(Debug)]
pub struct FrameParser {
    buf: Vec<u8>,
    capacity: usize,
    state: ParserState,
    truncated: bool,
}

impl FrameParser {
    /// Parser keeping at most `capacity - 1` bytes per frame
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            state: ParserState::Idle,
            truncated: false,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop any partially captured frame
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ParserState::Idle;
        self.truncated = false;
    }

    /// Advance by one byte; returns the frame completed by this byte
    pub fn push(&mut self, byte: u8) -> Option<RawFrame> {
        match self.state {
            ParserState::Idle => {
                if byte == START_MARKER {
                    self.state = ParserState::Capturing;
                }
                None
            }
            ParserState::Capturing if byte == END_MARKER => {
                self.state = ParserState::Idle;
                let frame = RawFrame {
                    bytes: std::mem::take(&mut self.buf),
                    truncated: std::mem::replace(&mut self.truncated, false),
                };
                self.buf.reserve(self.capacity);
                Some(frame)
            }
            ParserState::Capturing => {
                // Capacity counts the terminator slot of the wire-compatible C buffer
                if self.buf.len() < self.capacity - 1 {
                    self.buf.push(byte);
                } else {
                    self.truncated = true;
                }
                None
            }
        }
    }

    /// Consume bytes from `input` up to and including the first completed frame
    ///
    /// Bytes after that frame stay in `input` for the next call.
    pub fn feed(&mut self, input: &mut BytesMut) -> Option<RawFrame> {
        let mut consumed = 0;
        let mut frame = None;

        for &byte in input.iter() {
            consumed += 1;
            if let Some(done) = self.push(byte) {
                frame = Some(done);
                break;
            }
        }

        input.advance(consumed);
        frame
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAPACITY)
    }
}
