//! Outbound message encoding
//!
//! Every message shares one envelope; all multi-byte integers are
//! little-endian, written explicitly with `to_le_bytes`.
//!
//! ```text
//! ┌──────────┬─────┬───┬────────────┬───┬──────────┬────────────┐
//! │ <BLAECK: │ Key │ : │ MsgId (4)  │ : │ Payload  │ /BLAECK>\r\n│
//! └──────────┴─────┴───┴────────────┴───┴──────────┴────────────┘
//! ```
//!
//! ### Data payload (V5, key 0xD1)
//! ```text
//! Restart(1) : TsMode(1) [Ts(4)] : { Index(2) Value(w) }* Status(1) Crc(4)
//! ```
//! V4 (key 0xB1) drops the restart flag and the timestamp section:
//! `{ Index(2) Value(w) }* Status(1) Crc(4)`.
//!
//! The CRC covers everything from the key up to the last value; the
//! status byte and the `<BLAECK:` header are excluded.

use std::ops::RangeInclusive;

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::Checksum;
use crate::config::{ProtocolVersion, TimestampMode};
use crate::signal::SignalRegistry;

pub const MESSAGE_HEADER: &[u8] = b"<BLAECK:";
pub const MESSAGE_FOOTER: &[u8] = b"/BLAECK>\r\n";
pub const SEPARATOR: u8 = b':';

pub const KEY_SYMBOLS: u8 = 0xB0;
pub const KEY_DATA_V4: u8 = 0xB1;
pub const KEY_DEVICES_V4: u8 = 0xB4;
pub const KEY_DEVICES_V5: u8 = 0xB5;
pub const KEY_DATA_V5: u8 = 0xD1;

/// Status byte of a normal data transmission
pub const STATUS_OK: u8 = 0;

/// Which signals a message covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every registered signal
    All,
    /// A contiguous index range, clamped to the registry
    Range(RangeInclusive<usize>),
    /// Signals whose dirty flag is set
    Updated,
}

impl Selection {
    /// Indices selected from `registry`, in ascending order
    pub fn resolve(&self, registry: &SignalRegistry) -> Vec<usize> {
        let len = registry.len();
        match self {
            Selection::All => (0..len).collect(),
            Selection::Range(range) => {
                if len == 0 {
                    return Vec::new();
                }
                let end = (*range.end()).min(len - 1);
                (*range.start()..=end).collect()
            }
            Selection::Updated => registry
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_dirty())
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

/// Device identity fields of a device-info message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo<'a> {
    pub device_name: &'a str,
    pub hw_version: &'a str,
    pub fw_version: &'a str,
    pub engine_version: &'a str,
    pub engine_name: &'a str,
    pub client_slot: usize,
    pub data_enabled: bool,
    pub server_restarted: bool,
}

/// Per-message data header values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    /// First data message since startup
    pub restart: bool,
    /// Timestamp and its mode; `None` writes mode 0 without a value
    pub timestamp: Option<(TimestampMode, u32)>,
}

/// Builds messages into a buffer, feeding the CRC inline
struct MessageWriter {
    buf: BytesMut,
    crc: Checksum,
}

impl MessageWriter {
    fn begin(key: u8, message_id: u32) -> Self {
        let mut writer = Self {
            buf: BytesMut::with_capacity(64),
            crc: Checksum::standard(),
        };
        writer.buf.put_slice(MESSAGE_HEADER);
        writer.put_u8(key);
        writer.put_u8(SEPARATOR);
        writer.put(&message_id.to_le_bytes());
        writer.put_u8(SEPARATOR);
        writer
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
        self.crc.update(bytes);
    }

    fn put_u8(&mut self, byte: u8) {
        self.put(&[byte]);
    }

    /// NUL-terminated string
    fn put_cstr(&mut self, text: &str) {
        self.put(text.as_bytes());
        self.put_u8(0);
    }

    /// Status byte and CRC trailer, then the footer
    fn finish_with_crc(mut self, status: u8) -> Bytes {
        let crc = self.crc.value();
        self.buf.put_u8(status);
        self.buf.put_slice(&crc.to_le_bytes());
        self.buf.put_slice(MESSAGE_FOOTER);
        self.buf.freeze()
    }

    fn finish(mut self) -> Bytes {
        self.buf.put_slice(MESSAGE_FOOTER);
        self.buf.freeze()
    }
}

/// Encoder for the outbound message kinds
#[derive(Debug, Clone, Copy)]
pub struct MessageEncoder {
    version: ProtocolVersion,
}

impl MessageEncoder {
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn devices_key(&self) -> u8 {
        match self.version {
            ProtocolVersion::V4 => KEY_DEVICES_V4,
            ProtocolVersion::V5 => KEY_DEVICES_V5,
        }
    }

    pub fn data_key(&self) -> u8 {
        match self.version {
            ProtocolVersion::V4 => KEY_DATA_V4,
            ProtocolVersion::V5 => KEY_DATA_V5,
        }
    }

    /// Device-info message
    pub fn device_info(&self, message_id: u32, info: &DeviceInfo<'_>) -> Bytes {
        let mut w = MessageWriter::begin(self.devices_key(), message_id);
        w.put(&[0, 0]);
        w.put_cstr(or_default(info.device_name, "Unknown"));
        w.put_cstr(or_default(info.hw_version, "n/a"));
        w.put_cstr(or_default(info.fw_version, "n/a"));
        w.put_cstr(info.engine_version);
        w.put_cstr(info.engine_name);
        w.put_cstr(&info.client_slot.to_string());
        w.put_cstr(flag(info.data_enabled));
        if self.version == ProtocolVersion::V5 {
            w.put_cstr(flag(info.server_restarted));
        }
        w.finish()
    }

    /// Symbol-table message; always produced, even for an empty selection
    pub fn symbol_table(&self, message_id: u32, registry: &SignalRegistry, selection: &Selection) -> Bytes {
        let mut w = MessageWriter::begin(KEY_SYMBOLS, message_id);
        for index in selection.resolve(registry) {
            if let Some(signal) = registry.get(index) {
                w.put(&[0, 0]);
                w.put_cstr(signal.name());
                w.put_u8(signal.kind().type_tag());
            }
        }
        w.finish()
    }

    /// Data message for `indices`
    ///
    /// Returns `None` when `indices` is empty: nothing qualifies, nothing is sent.
    pub fn data(&self, message_id: u32, registry: &SignalRegistry, indices: &[usize], header: DataHeader) -> Option<Bytes> {
        if indices.is_empty() {
            return None;
        }

        let mut w = MessageWriter::begin(self.data_key(), message_id);

        if self.version == ProtocolVersion::V5 {
            w.put_u8(header.restart as u8);
            w.put_u8(SEPARATOR);
            match header.timestamp {
                Some((mode, ts)) if mode != TimestampMode::None => {
                    w.put_u8(mode.as_byte());
                    w.put(&ts.to_le_bytes());
                }
                _ => w.put_u8(TimestampMode::None.as_byte()),
            }
            w.put_u8(SEPARATOR);
        }

        for &index in indices {
            let (Some(signal), Ok(wire_index)) = (registry.get(index), u16::try_from(index)) else {
                continue;
            };
            w.put(&wire_index.to_le_bytes());
            w.put(&signal.value().to_le_bytes());
        }

        Some(w.finish_with_crc(STATUS_OK))
    }
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self::new(ProtocolVersion::V5)
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
