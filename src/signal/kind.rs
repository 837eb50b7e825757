//! Signal kinds and the fixed-width value codec
//!
//! ## Wire Widths
//! ```text
//! ┌──────────┬─────┬───────┬──────────────┐
//! │ Kind     │ Tag │ Bytes │ Encoding     │
//! ├──────────┼─────┼───────┼──────────────┤
//! │ Bool     │  0  │   1   │ 0x00 / 0x01  │
//! │ Byte     │  1  │   1   │ u8           │
//! │ Int16    │  2  │   2   │ i16 LE       │
//! │ UInt16   │  3  │   2   │ u16 LE       │
//! │ Int32    │  6  │   4   │ i32 LE       │
//! │ UInt32   │  7  │   4   │ u32 LE       │
//! │ Float32  │  8  │   4   │ IEEE-754 LE  │
//! │ Float64  │  9  │   8   │ IEEE-754 LE  │
//! └──────────┴─────┴───────┴──────────────┘
//! ```
//!
//! Tags 4 and 5 denote a 16-bit native `int`/`unsigned int` on small
//! targets. They are never emitted (16-bit integers always go out as 2/3)
//! but are decoded as Int16/UInt16.
//!
//! ## Platform Width Policy
//! Rust scalars have fixed widths, so the only ambiguous types are the C
//! `int` and `double` aliases. Binding a `Variable<c_int>` resolves to the
//! `i16` or `i32` implementation depending on the target, and `c_double`
//! resolves to `f32` on targets where it is identical to `float`. The
//! resulting kinds are published as [`NATIVE_INT_KIND`] and
//! [`NATIVE_DOUBLE_KIND`].

use core::ffi::{c_double, c_float, c_int};
use core::mem::size_of;

/// Wire kind of the native C `int`
pub const NATIVE_INT_KIND: SignalKind = if size_of::<c_int>() == 4 {
    SignalKind::Int32
} else {
    SignalKind::Int16
};

/// Wire kind of the native C `double`
pub const NATIVE_DOUBLE_KIND: SignalKind = if size_of::<c_double>() == size_of::<c_float>() {
    SignalKind::Float32
} else {
    SignalKind::Float64
};

/// Largest wire width of any kind
pub const MAX_VALUE_WIDTH: usize = 8;

/// Scalar kind of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Bool,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl SignalKind {
    /// One-byte type tag used in symbol-table messages
    pub fn type_tag(self) -> u8 {
        match self {
            SignalKind::Bool => 0,
            SignalKind::Byte => 1,
            SignalKind::Int16 => 2,
            SignalKind::UInt16 => 3,
            SignalKind::Int32 => 6,
            SignalKind::UInt32 => 7,
            SignalKind::Float32 => 8,
            SignalKind::Float64 => 9,
        }
    }

    /// Inverse of [`type_tag`](Self::type_tag), accepting the 16-bit native int tags
    pub fn from_type_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SignalKind::Bool),
            1 => Some(SignalKind::Byte),
            2 | 4 => Some(SignalKind::Int16),
            3 | 5 => Some(SignalKind::UInt16),
            6 => Some(SignalKind::Int32),
            7 => Some(SignalKind::UInt32),
            8 => Some(SignalKind::Float32),
            9 => Some(SignalKind::Float64),
            _ => None,
        }
    }

    /// Number of bytes a value of this kind occupies on the wire
    pub fn wire_width(self) -> usize {
        match self {
            SignalKind::Bool | SignalKind::Byte => 1,
            SignalKind::Int16 | SignalKind::UInt16 => 2,
            SignalKind::Int32 | SignalKind::UInt32 | SignalKind::Float32 => 4,
            SignalKind::Float64 => 8,
        }
    }
}

/// A scalar value tagged with its kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
}

/// Little-endian encoding of a [`WireValue`], at most [`MAX_VALUE_WIDTH`] bytes
#[derive(Debug, Clone, Copy)]
pub struct WireBytes {
    buf: [u8; MAX_VALUE_WIDTH],
    len: usize,
}

impl WireBytes {
    fn from_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; MAX_VALUE_WIDTH];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self { buf, len: bytes.len() }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl std::ops::Deref for WireBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl WireValue {
    /// Kind of this value
    pub fn kind(&self) -> SignalKind {
        match self {
            WireValue::Bool(_) => SignalKind::Bool,
            WireValue::Byte(_) => SignalKind::Byte,
            WireValue::Int16(_) => SignalKind::Int16,
            WireValue::UInt16(_) => SignalKind::UInt16,
            WireValue::Int32(_) => SignalKind::Int32,
            WireValue::UInt32(_) => SignalKind::UInt32,
            WireValue::Float32(_) => SignalKind::Float32,
            WireValue::Float64(_) => SignalKind::Float64,
        }
    }

    /// Encode at the kind's wire width, little-endian
    pub fn to_le_bytes(&self) -> WireBytes {
        match *self {
            WireValue::Bool(v) => WireBytes::from_slice(&[v as u8]),
            WireValue::Byte(v) => WireBytes::from_slice(&[v]),
            WireValue::Int16(v) => WireBytes::from_slice(&v.to_le_bytes()),
            WireValue::UInt16(v) => WireBytes::from_slice(&v.to_le_bytes()),
            WireValue::Int32(v) => WireBytes::from_slice(&v.to_le_bytes()),
            WireValue::UInt32(v) => WireBytes::from_slice(&v.to_le_bytes()),
            WireValue::Float32(v) => WireBytes::from_slice(&v.to_le_bytes()),
            WireValue::Float64(v) => WireBytes::from_slice(&v.to_le_bytes()),
        }
    }

    /// Decode a value of `kind` from the front of `bytes`
    ///
    /// Returns `None` when fewer than `kind.wire_width()` bytes are present.
    pub fn from_le_bytes(kind: SignalKind, bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..kind.wire_width())?;
        let value = match kind {
            SignalKind::Bool => WireValue::Bool(bytes[0] != 0),
            SignalKind::Byte => WireValue::Byte(bytes[0]),
            SignalKind::Int16 => WireValue::Int16(i16::from_le_bytes([bytes[0], bytes[1]])),
            SignalKind::UInt16 => WireValue::UInt16(u16::from_le_bytes([bytes[0], bytes[1]])),
            SignalKind::Int32 => WireValue::Int32(i32::from_le_bytes(le4(bytes))),
            SignalKind::UInt32 => WireValue::UInt32(u32::from_le_bytes(le4(bytes))),
            SignalKind::Float32 => WireValue::Float32(f32::from_le_bytes(le4(bytes))),
            SignalKind::Float64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                WireValue::Float64(f64::from_le_bytes(raw))
            }
        };
        Some(value)
    }

    /// Bitwise equality (distinguishes NaN payloads and signed zeros)
    pub fn bit_eq(&self, other: &WireValue) -> bool {
        self.kind() == other.kind() && self.to_le_bytes().as_slice() == other.to_le_bytes().as_slice()
    }
}

fn le4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

impl std::fmt::Display for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireValue::Bool(v) => write!(f, "{}", v),
            WireValue::Byte(v) => write!(f, "{}", v),
            WireValue::Int16(v) => write!(f, "{}", v),
            WireValue::UInt16(v) => write!(f, "{}", v),
            WireValue::Int32(v) => write!(f, "{}", v),
            WireValue::UInt32(v) => write!(f, "{}", v),
            WireValue::Float32(v) => write!(f, "{}", v),
            WireValue::Float64(v) => write!(f, "{}", v),
        }
    }
}
