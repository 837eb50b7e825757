//! Tests for signal kinds and the value codec
//!
//! These tests verify:
//! - Type tags and wire widths
//! - Little-endian value encoding
//! - Decoding edge cases (short input, legacy tags, bool normalization)
//! - Typed storage bindings

use std::ffi::c_int;

use blaeck_tcp::signal::{Scalar, SignalKind, Variable, WireValue, MAX_VALUE_WIDTH, NATIVE_INT_KIND};

// =============================================================================
// Type Tag Tests
// =============================================================================

#[test]
fn test_type_tags() {
    let tags: Vec<(SignalKind, u8)> = [
        SignalKind::Bool,
        SignalKind::Byte,
        SignalKind::Int16,
        SignalKind::UInt16,
        SignalKind::Int32,
        SignalKind::UInt32,
        SignalKind::Float32,
        SignalKind::Float64,
    ]
    .into_iter()
    .map(|k| (k, k.type_tag()))
    .collect();

    assert_eq!(
        tags.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 6, 7, 8, 9]
    );
    for (kind, tag) in tags {
        assert_eq!(SignalKind::from_type_tag(tag), Some(kind));
    }
}

#[test]
fn test_legacy_int_tags_decode_as_16_bit() {
    assert_eq!(SignalKind::from_type_tag(4), Some(SignalKind::Int16));
    assert_eq!(SignalKind::from_type_tag(5), Some(SignalKind::UInt16));
    assert_eq!(SignalKind::from_type_tag(10), None);
}

#[test]
fn test_wire_widths() {
    assert_eq!(SignalKind::Bool.wire_width(), 1);
    assert_eq!(SignalKind::Byte.wire_width(), 1);
    assert_eq!(SignalKind::UInt16.wire_width(), 2);
    assert_eq!(SignalKind::Int32.wire_width(), 4);
    assert_eq!(SignalKind::Float32.wire_width(), 4);
    assert_eq!(SignalKind::Float64.wire_width(), MAX_VALUE_WIDTH);
}

// =============================================================================
// Value Encoding Tests
// =============================================================================

#[test]
fn test_le_encoding() {
    assert_eq!(WireValue::Bool(true).to_le_bytes().as_slice(), &[1]);
    assert_eq!(WireValue::Int16(-2).to_le_bytes().as_slice(), &[0xFE, 0xFF]);
    assert_eq!(WireValue::UInt32(0x0102_0304).to_le_bytes().as_slice(), &[4, 3, 2, 1]);
    assert_eq!(WireValue::Float32(1.0).to_le_bytes().as_slice(), &[0x00, 0x00, 0x80, 0x3F]);
    assert_eq!(WireValue::Float64(-0.0).to_le_bytes().len(), 8);
}

#[test]
fn test_decode_requires_full_width() {
    assert_eq!(WireValue::from_le_bytes(SignalKind::Int32, &[1, 2, 3]), None);
    assert_eq!(
        WireValue::from_le_bytes(SignalKind::UInt16, &[0x34, 0x12, 0xFF]),
        Some(WireValue::UInt16(0x1234))
    );
}

#[test]
fn test_decode_bool_nonzero_is_true() {
    assert_eq!(WireValue::from_le_bytes(SignalKind::Bool, &[7]), Some(WireValue::Bool(true)));
    assert_eq!(WireValue::from_le_bytes(SignalKind::Bool, &[0]), Some(WireValue::Bool(false)));
}

#[test]
fn test_nan_bit_equality() {
    let nan = WireValue::Float32(f32::NAN);
    assert_ne!(nan, nan);
    assert!(nan.bit_eq(&nan));
    assert!(!WireValue::Float32(0.0).bit_eq(&WireValue::Float32(-0.0)));
}

#[test]
fn test_display() {
    assert_eq!(WireValue::Int16(-5).to_string(), "-5");
    assert_eq!(WireValue::Bool(true).to_string(), "true");
}

// =============================================================================
// Binding Tests
// =============================================================================

#[test]
fn test_scalar_kinds() {
    assert_eq!(<u8 as Scalar>::KIND, SignalKind::Byte);
    assert_eq!(<f64 as Scalar>::KIND, SignalKind::Float64);
    assert_eq!(<c_int as Scalar>::KIND, NATIVE_INT_KIND);
}

#[test]
fn test_binding_store_checks_kind() {
    let v = Variable::new(10u16);
    let binding = u16::bind(&v);

    assert!(!binding.store(WireValue::Int16(3)));
    assert_eq!(v.get(), 10);

    assert!(binding.store(WireValue::UInt16(11)));
    assert_eq!(v.get(), 11);
    assert_eq!(binding.load(), WireValue::UInt16(11));
}

#[test]
fn test_variable_handles_share_storage() {
    let a = Variable::new(1i32);
    let b = a.clone();

    b.set(5);
    a.modify(|x| *x += 1);

    assert_eq!(b.get(), 6);
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&Variable::new(6)));
}
