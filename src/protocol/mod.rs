//! Protocol Module
//!
//! Defines the wire protocol between the device and its clients.
//!
//! ### Inbound (client → device)
//! ```text
//! <VERB,param0,param1,...,param9>
//! ```
//!
//! ### Commands
//! - `BLAECK.WRITE_SYMBOLS,id0,id1,id2,id3` - symbol table to requester
//! - `BLAECK.WRITE_DATA,id0,id1,id2,id3`    - all values to data clients
//! - `BLAECK.GET_DEVICES,id0,id1,id2,id3`   - device info to requester
//! - `BLAECK.ACTIVATE,ms0,ms1,ms2,ms3`      - start periodic data
//! - `BLAECK.DEACTIVATE`                    - stop periodic data
//!
//! ### Outbound (device → client)
//! ```text
//! ┌──────────┬─────┬───┬────────────┬───┬──────────┬─────────────┐
//! │ <BLAECK: │ Key │ : │ MsgId (4)  │ : │ Payload  │ /BLAECK>\r\n│
//! └──────────┴─────┴───┴────────────┴───┴──────────┴─────────────┘
//! ```
//!
//! ### Message Keys
//! - 0xB0: symbol table
//! - 0xB1 / 0xD1: data (V4 / V5)
//! - 0xB4 / 0xB5: device info (V4 / V5)

mod checksum;
mod codec;
mod command;
mod frame;
mod message;

pub use checksum::{crc32, Checksum, CrcConfig, CRC_32};
pub use codec::{
    decode_data, decode_device_info, decode_message, decode_symbol_table, read_message, take_message,
    write_command, DataMessage, DeviceInfoMessage, Message, RawMessage, SymbolEntry, SymbolTable,
};
pub use command::{
    atoi, Command, CommandFrame, MAX_PARAMS, MAX_TEXT_LEN, VERB_ACTIVATE, VERB_DEACTIVATE, VERB_GET_DEVICES,
    VERB_WRITE_DATA, VERB_WRITE_SYMBOLS,
};
pub use frame::{FrameParser, ParserState, RawFrame, DEFAULT_FRAME_CAPACITY, END_MARKER, START_MARKER};
pub use message::{
    DataHeader, DeviceInfo, MessageEncoder, Selection, KEY_DATA_V4, KEY_DATA_V5, KEY_DEVICES_V4, KEY_DEVICES_V5,
    KEY_SYMBOLS, MESSAGE_FOOTER, MESSAGE_HEADER, SEPARATOR, STATUS_OK,
};
