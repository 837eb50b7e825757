//! Tests for the CRC-32 accumulator
//!
//! These tests verify:
//! - Standard check values
//! - Incremental updates equal one-shot hashing
//! - The bitwise engine for non-standard parameter sets

use blaeck_tcp::protocol::{crc32, Checksum, CrcConfig, CRC_32};

const CHECK_INPUT: &[u8] = b"123456789";

// =============================================================================
// Standard CRC-32 Tests
// =============================================================================

#[test]
fn test_standard_check_value() {
    let mut checksum = Checksum::standard();
    checksum.update(CHECK_INPUT);

    assert_eq!(checksum.value(), 0xCBF4_3926);
    assert_eq!(crc32(CHECK_INPUT), 0xCBF4_3926);
}

#[test]
fn test_empty_input() {
    assert_eq!(Checksum::default().value(), 0);
}

#[test]
fn test_incremental_matches_one_shot() {
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

    let mut checksum = Checksum::standard();
    for chunk in data.chunks(7) {
        checksum.update(chunk);
    }

    assert_eq!(checksum.value(), crc32(&data));
    assert_eq!(checksum.value(), crc32fast::hash(&data));
}

#[test]
fn test_value_does_not_consume_state() {
    let mut checksum = Checksum::standard();
    checksum.update(b"1234");
    let _ = checksum.value();
    checksum.update(b"56789");

    assert_eq!(checksum.value(), 0xCBF4_3926);
}

#[test]
fn test_reset() {
    let mut checksum = Checksum::standard();
    checksum.update(b"garbage");
    checksum.reset();
    checksum.update(CHECK_INPUT);

    assert_eq!(checksum.value(), 0xCBF4_3926);
}

// =============================================================================
// Bitwise Engine Tests
// =============================================================================

#[test]
fn test_bzip2_parameters() {
    let config = CrcConfig {
        reflect_in: false,
        reflect_out: false,
        ..CRC_32
    };
    let mut checksum = Checksum::new(config);
    checksum.update(CHECK_INPUT);

    assert_eq!(checksum.value(), 0xFC89_1918);
    assert_eq!(checksum.config(), &config);
}

#[test]
fn test_mpeg2_parameters() {
    let mut checksum = Checksum::new(CrcConfig {
        poly: 0x04C1_1DB7,
        init: 0xFFFF_FFFF,
        xor_out: 0,
        reflect_in: false,
        reflect_out: false,
    });
    checksum.update(CHECK_INPUT);

    assert_eq!(checksum.value(), 0x0376_E6E7);
}

#[test]
fn test_reflected_bitwise_matches_fast_path() {
    // Same as CRC_32 except the final XOR, so it runs bitwise
    let config = CrcConfig { xor_out: 0, ..CRC_32 };
    let mut checksum = Checksum::new(config);
    checksum.update(CHECK_INPUT);

    assert_eq!(checksum.value() ^ 0xFFFF_FFFF, crc32(CHECK_INPUT));
}
