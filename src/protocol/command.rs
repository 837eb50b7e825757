//! Command definitions
//!
//! Tokenizes captured frames and maps verbs to engine actions.
//!
//! ## Frame Text
//! ```text
//! VERB,param0,param1 param2,...,param9
//! ```
//! The verb ends at the first `,`. `param0` also ends at `,` only, so it may
//! carry spaces; later parameters end at `,` or space. Empty tokens are
//! skipped. `param0` is kept both as an integer and as text (max 15 bytes).

/// Number of integer parameters in a command frame
pub const MAX_PARAMS: usize = 10;

/// Maximum byte length of the text form of `param0`
pub const MAX_TEXT_LEN: usize = 15;

pub const VERB_WRITE_SYMBOLS: &str = "BLAECK.WRITE_SYMBOLS";
pub const VERB_WRITE_DATA: &str = "BLAECK.WRITE_DATA";
pub const VERB_GET_DEVICES: &str = "BLAECK.GET_DEVICES";
pub const VERB_ACTIVATE: &str = "BLAECK.ACTIVATE";
pub const VERB_DEACTIVATE: &str = "BLAECK.DEACTIVATE";

/// A tokenized command frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Command verb
    pub verb: String,

    /// Integer parameters, 0 where absent or non-numeric
    pub params: [i32; MAX_PARAMS],

    /// First parameter verbatim, truncated to [`MAX_TEXT_LEN`] bytes
    pub text: String,
}

impl CommandFrame {
    /// Tokenize the bytes captured between `<` and `>`
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut tokens = Tokenizer::new(&text);

        let verb = tokens.next_token(&[',']).unwrap_or_default().to_string();
        let mut params = [0i32; MAX_PARAMS];

        let first = tokens.next_token(&[',']);
        let text = first.map(|t| truncate_to(t, MAX_TEXT_LEN).to_string()).unwrap_or_default();
        params[0] = first.map(atoi).unwrap_or(0);

        for param in params.iter_mut().skip(1) {
            *param = tokens.next_token(&[',', ' ']).map(atoi).unwrap_or(0);
        }

        Self { verb, params, text }
    }

    /// Parameters 0..4 packed as little-endian bytes into a u32
    ///
    /// Each parameter is expected to be a byte; larger values overlap their
    /// neighbours exactly as the bitwise OR on the device does.
    pub fn packed_u32(&self) -> u32 {
        let p = |i: usize| self.params[i] as u32;
        p(0) | p(1).wrapping_shl(8) | p(2).wrapping_shl(16) | p(3).wrapping_shl(24)
    }
}

/// Built-in commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Send the symbol table to the requester
    WriteSymbols { message_id: u32 },

    /// Broadcast all signal values
    WriteData { message_id: u32 },

    /// Send device information to the requester
    GetDevices { message_id: u32 },

    /// Start periodic data transmission
    Activate { interval_ms: u32 },

    /// Stop periodic data transmission
    Deactivate,
}

impl Command {
    /// Map a parsed frame to a built-in command; `None` for unknown verbs
    pub fn from_frame(frame: &CommandFrame) -> Option<Self> {
        let packed = frame.packed_u32();
        match frame.verb.as_str() {
            VERB_WRITE_SYMBOLS => Some(Command::WriteSymbols { message_id: packed }),
            VERB_WRITE_DATA => Some(Command::WriteData { message_id: packed }),
            VERB_GET_DEVICES => Some(Command::GetDevices { message_id: packed }),
            VERB_ACTIVATE => Some(Command::Activate { interval_ms: packed }),
            VERB_DEACTIVATE => Some(Command::Deactivate),
            _ => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::WriteSymbols { .. } => VERB_WRITE_SYMBOLS,
            Command::WriteData { .. } => VERB_WRITE_DATA,
            Command::GetDevices { .. } => VERB_GET_DEVICES,
            Command::Activate { .. } => VERB_ACTIVATE,
            Command::Deactivate => VERB_DEACTIVATE,
        }
    }

    /// Encode as an inbound frame, e.g. `<BLAECK.WRITE_SYMBOLS,7,0,0,0>`
    pub fn to_frame(&self) -> String {
        let packed = match *self {
            Command::WriteSymbols { message_id }
            | Command::WriteData { message_id }
            | Command::GetDevices { message_id } => message_id,
            Command::Activate { interval_ms } => interval_ms,
            Command::Deactivate => return format!("<{}>", self.verb()),
        };
        let [b0, b1, b2, b3] = packed.to_le_bytes();
        format!("<{},{},{},{},{}>", self.verb(), b0, b1, b2, b3)
    }
}

/// C `atoi`: optional whitespace and sign, then leading digits; 0 if none
pub fn atoi(text: &str) -> i32 {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) {
        i += 1;
    }

    let negative = match bytes.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let mut value: i32 = 0;
    while let Some(digit) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
        value = value.wrapping_mul(10).wrapping_add((digit - b'0') as i32);
        i += 1;
    }

    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a char
fn truncate_to(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// `strtok`-style splitter: leading delimiters are skipped, empty tokens never returned
struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn next_token(&mut self, delims: &[char]) -> Option<&'a str> {
        let start = self.rest.trim_start_matches(|c| delims.contains(&c));
        if start.is_empty() {
            self.rest = start;
            return None;
        }

        match start.find(|c| delims.contains(&c)) {
            Some(end) => {
                self.rest = &start[end + 1..];
                Some(&start[..end])
            }
            None => {
                self.rest = "";
                Some(start)
            }
        }
    }
}
