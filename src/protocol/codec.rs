//! Protocol codec
//!
//! Client-side decoding of outbound messages.
//!
//! Messages are located by their literal `<BLAECK:` header and
//! `/BLAECK>\r\n` footer; anything in between two messages (for example the
//! plain-text greeting) is skipped. Data messages can only be decoded
//! against a symbol table, since values carry no width on the wire.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BytesMut};

use super::checksum::Checksum;
use super::command::Command;
use super::message::{
    KEY_DATA_V4, KEY_DATA_V5, KEY_DEVICES_V4, KEY_DEVICES_V5, KEY_SYMBOLS, MESSAGE_FOOTER, MESSAGE_HEADER, SEPARATOR,
};
use crate::config::TimestampMode;
use crate::error::{BlaeckError, Result};
use crate::signal::{SignalKind, WireValue};

/// Key + ':' + message ID + ':'
const ENVELOPE_SIZE: usize = 7;

/// Status byte + CRC
const TRAILER_SIZE: usize = 5;

const READ_CHUNK_SIZE: usize = 1024;

// =============================================================================
// Framing
// =============================================================================

/// One enveloped message, payload still undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub key: u8,
    pub message_id: u32,
    /// Bytes between the second separator and the footer
    pub payload: Vec<u8>,
}

/// Take the next complete message out of `buf`
///
/// Returns `Ok(None)` when no complete message is buffered yet. Bytes in
/// front of the header are discarded.
pub fn take_message(buf: &mut BytesMut) -> Result<Option<RawMessage>> {
    let start = match find(buf, MESSAGE_HEADER) {
        Some(pos) => pos,
        None => {
            // Keep a possible partial header at the tail
            let keep = MESSAGE_HEADER.len() - 1;
            if buf.len() > keep {
                buf.advance(buf.len() - keep);
            }
            return Ok(None);
        }
    };
    buf.advance(start);

    let body_start = MESSAGE_HEADER.len();
    if buf.len() < body_start + ENVELOPE_SIZE {
        return Ok(None);
    }

    let end = match find(&buf[body_start + ENVELOPE_SIZE..], MESSAGE_FOOTER) {
        Some(pos) => body_start + ENVELOPE_SIZE + pos,
        None => return Ok(None),
    };

    let body = &buf[body_start..end];
    if body[1] != SEPARATOR || body[6] != SEPARATOR {
        buf.advance(end + MESSAGE_FOOTER.len());
        return Err(BlaeckError::Protocol("Malformed message envelope".to_string()));
    }

    let message = RawMessage {
        key: body[0],
        message_id: u32::from_le_bytes([body[2], body[3], body[4], body[5]]),
        payload: body[ENVELOPE_SIZE..].to_vec(),
    };
    buf.advance(end + MESSAGE_FOOTER.len());
    Ok(Some(message))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// =============================================================================
// Decoded Messages
// =============================================================================

/// Decoded device-info message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoMessage {
    pub message_id: u32,
    pub device_name: String,
    pub hw_version: String,
    pub fw_version: String,
    pub engine_version: String,
    pub engine_name: String,
    pub client_slot: usize,
    pub data_enabled: bool,
    /// Absent in V4 messages
    pub server_restarted: Option<bool>,
}

/// One symbol-table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SignalKind,
}

/// Decoded symbol-table message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub message_id: u32,
    pub symbols: Vec<SymbolEntry>,
}

/// Decoded data message
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub message_id: u32,
    /// Absent in V4 messages
    pub restarted: Option<bool>,
    pub timestamp_mode: TimestampMode,
    pub timestamp: Option<u32>,
    pub entries: Vec<(u16, WireValue)>,
    pub status: u8,
    pub crc: u32,
}

/// Any decoded message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Devices(DeviceInfoMessage),
    Symbols(SymbolTable),
    Data(DataMessage),
}

/// Decode `raw`; data messages are decoded against `symbols`
pub fn decode_message(raw: &RawMessage, symbols: &[SymbolEntry]) -> Result<Message> {
    match raw.key {
        KEY_DEVICES_V4 | KEY_DEVICES_V5 => decode_device_info(raw).map(Message::Devices),
        KEY_SYMBOLS => decode_symbol_table(raw).map(Message::Symbols),
        KEY_DATA_V4 | KEY_DATA_V5 => decode_data(raw, symbols).map(Message::Data),
        other => Err(BlaeckError::Protocol(format!("Unknown message key: 0x{:02x}", other))),
    }
}

pub fn decode_device_info(raw: &RawMessage) -> Result<DeviceInfoMessage> {
    let body = raw
        .payload
        .get(2..)
        .ok_or_else(|| BlaeckError::Protocol("Device info: missing reserved bytes".to_string()))?;

    let mut fields = body.split(|&b| b == 0).map(|f| String::from_utf8_lossy(f).into_owned());
    let mut next = |what: &str| {
        fields
            .next()
            .ok_or_else(|| BlaeckError::Protocol(format!("Device info: missing {}", what)))
    };

    let device_name = next("device name")?;
    let hw_version = next("hardware version")?;
    let fw_version = next("firmware version")?;
    let engine_version = next("engine version")?;
    let engine_name = next("engine name")?;
    let client_slot = next("client slot")?
        .parse()
        .map_err(|_| BlaeckError::Protocol("Device info: bad client slot".to_string()))?;
    let data_enabled = next("data enabled flag")? == "1";
    let server_restarted = if raw.key == KEY_DEVICES_V5 {
        Some(next("restart flag")? == "1")
    } else {
        None
    };

    Ok(DeviceInfoMessage {
        message_id: raw.message_id,
        device_name,
        hw_version,
        fw_version,
        engine_version,
        engine_name,
        client_slot,
        data_enabled,
        server_restarted,
    })
}

pub fn decode_symbol_table(raw: &RawMessage) -> Result<SymbolTable> {
    let mut rest = raw.payload.as_slice();
    let mut symbols = Vec::new();

    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(BlaeckError::Protocol("Symbol table: truncated entry".to_string()));
        }
        rest = &rest[2..];

        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| BlaeckError::Protocol("Symbol table: unterminated name".to_string()))?;
        let name = String::from_utf8_lossy(&rest[..nul]).into_owned();

        let tag = *rest
            .get(nul + 1)
            .ok_or_else(|| BlaeckError::Protocol("Symbol table: missing type tag".to_string()))?;
        let kind = SignalKind::from_type_tag(tag)
            .ok_or_else(|| BlaeckError::Protocol(format!("Symbol table: unknown type tag {}", tag)))?;

        symbols.push(SymbolEntry { name, kind });
        rest = &rest[nul + 2..];
    }

    Ok(SymbolTable {
        message_id: raw.message_id,
        symbols,
    })
}

pub fn decode_data(raw: &RawMessage, symbols: &[SymbolEntry]) -> Result<DataMessage> {
    let payload = raw.payload.as_slice();
    if payload.len() < TRAILER_SIZE {
        return Err(BlaeckError::Protocol("Data: missing trailer".to_string()));
    }

    let (body, trailer) = payload.split_at(payload.len() - TRAILER_SIZE);
    let status = trailer[0];
    let crc = u32::from_le_bytes([trailer[1], trailer[2], trailer[3], trailer[4]]);

    let mut checksum = Checksum::standard();
    checksum.update(&[raw.key, SEPARATOR]);
    checksum.update(&raw.message_id.to_le_bytes());
    checksum.update(&[SEPARATOR]);
    checksum.update(body);
    if checksum.value() != crc {
        return Err(BlaeckError::Protocol(format!(
            "Data: CRC mismatch (expected 0x{:08x}, got 0x{:08x})",
            checksum.value(),
            crc
        )));
    }

    let mut rest = body;
    let mut restarted = None;
    let mut timestamp_mode = TimestampMode::None;
    let mut timestamp = None;

    if raw.key == KEY_DATA_V5 {
        if rest.len() < 4 || rest[1] != SEPARATOR {
            return Err(BlaeckError::Protocol("Data: malformed header".to_string()));
        }
        restarted = Some(rest[0] != 0);
        timestamp_mode = TimestampMode::from_byte(rest[2])
            .ok_or_else(|| BlaeckError::Protocol(format!("Data: unknown timestamp mode {}", rest[2])))?;
        rest = &rest[3..];

        if timestamp_mode != TimestampMode::None {
            if rest.len() < 5 {
                return Err(BlaeckError::Protocol("Data: truncated timestamp".to_string()));
            }
            timestamp = Some(u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]));
            rest = &rest[4..];
        }

        if rest.first() != Some(&SEPARATOR) {
            return Err(BlaeckError::Protocol("Data: missing header separator".to_string()));
        }
        rest = &rest[1..];
    }

    let mut entries = Vec::new();
    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(BlaeckError::Protocol("Data: truncated signal index".to_string()));
        }
        let index = u16::from_le_bytes([rest[0], rest[1]]);
        let kind = symbols
            .get(index as usize)
            .map(|s| s.kind)
            .ok_or_else(|| BlaeckError::Protocol(format!("Data: unknown signal index {}", index)))?;
        let value = WireValue::from_le_bytes(kind, &rest[2..])
            .ok_or_else(|| BlaeckError::Protocol(format!("Data: truncated value for signal {}", index)))?;
        entries.push((index, value));
        rest = &rest[2 + kind.wire_width()..];
    }

    Ok(DataMessage {
        message_id: raw.message_id,
        restarted,
        timestamp_mode,
        timestamp,
        entries,
        status,
        crc,
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read until a complete message is buffered (blocking)
///
/// `buf` carries bytes across calls; pass the same buffer every time.
pub fn read_message<R: Read>(reader: &mut R, buf: &mut BytesMut) -> Result<RawMessage> {
    loop {
        if let Some(message) = take_message(buf)? {
            return Ok(message);
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if read == 0 {
            return Err(BlaeckError::Network("Connection closed by device".to_string()));
        }
        buf.extend_from_slice(&chunk[..read]);
    }
}

/// Write a command frame to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(command.to_frame().as_bytes())?;
    writer.flush()?;
    Ok(())
}
