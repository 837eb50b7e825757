//! Tests for command tokenizing and dispatch mapping
//!
//! These tests verify:
//! - Verb and parameter tokenization
//! - Text form of the first parameter
//! - Message ID / interval packing
//! - Mapping to built-in commands and back to frames

use blaeck_tcp::protocol::{atoi, Command, CommandFrame, MAX_PARAMS, VERB_ACTIVATE, VERB_WRITE_DATA};

// =============================================================================
// Tokenizer Tests
// =============================================================================

#[test]
fn test_parse_verb_and_params() {
    let frame = CommandFrame::parse(b"A,1,2");

    assert_eq!(frame.verb, "A");
    assert_eq!(frame.params[0], 1);
    assert_eq!(frame.params[1], 2);
    assert!(frame.params[2..].iter().all(|&p| p == 0));
    assert_eq!(frame.text, "1");
}

#[test]
fn test_verb_only() {
    let frame = CommandFrame::parse(b"BLAECK.DEACTIVATE");

    assert_eq!(frame.verb, "BLAECK.DEACTIVATE");
    assert_eq!(frame.params, [0; MAX_PARAMS]);
    assert_eq!(frame.text, "");
}

#[test]
fn test_empty_frame() {
    let frame = CommandFrame::parse(b"");

    assert_eq!(frame.verb, "");
    assert_eq!(frame.text, "");
}

#[test]
fn test_first_param_keeps_spaces() {
    let frame = CommandFrame::parse(b"SAY,hello world,5");

    assert_eq!(frame.text, "hello world");
    assert_eq!(frame.params[0], 0);
    assert_eq!(frame.params[1], 5);
}

#[test]
fn test_later_params_split_on_space() {
    let frame = CommandFrame::parse(b"SET,1,2 3, 4");

    assert_eq!(&frame.params[..4], &[1, 2, 3, 4]);
}

#[test]
fn test_empty_tokens_skipped() {
    let frame = CommandFrame::parse(b"SET,,7,,8");

    assert_eq!(frame.params[0], 7);
    assert_eq!(frame.params[1], 8);
}

#[test]
fn test_text_truncated_to_fifteen_bytes() {
    let frame = CommandFrame::parse(b"NAME,abcdefghijklmnopqrstuvwxyz");

    assert_eq!(frame.text, "abcdefghijklmno");
}

#[test]
fn test_extra_params_ignored() {
    let frame = CommandFrame::parse(b"X,0,1,2,3,4,5,6,7,8,9,10,11");

    assert_eq!(frame.params[9], 9);
}

#[test]
fn test_atoi() {
    assert_eq!(atoi("42"), 42);
    assert_eq!(atoi("  -17xyz"), -17);
    assert_eq!(atoi("+8"), 8);
    assert_eq!(atoi("abc"), 0);
    assert_eq!(atoi(""), 0);
    assert_eq!(atoi("3.9"), 3);
}

// =============================================================================
// Command Mapping Tests
// =============================================================================

#[test]
fn test_packed_message_id() {
    let frame = CommandFrame::parse(b"BLAECK.WRITE_DATA,11,22,33,44");

    assert_eq!(frame.packed_u32(), 11 | 22 << 8 | 33 << 16 | 44 << 24);
    assert_eq!(
        Command::from_frame(&frame),
        Some(Command::WriteData {
            message_id: 0x2C21_160B
        })
    );
}

#[test]
fn test_timed_message_id_bytes() {
    let frame = CommandFrame::parse(b"BLAECK.WRITE_SYMBOLS,11,11,11,11");

    assert_eq!(frame.packed_u32(), 185_273_099);
}

#[test]
fn test_activate_interval() {
    let frame = CommandFrame::parse(b"BLAECK.ACTIVATE,96,234");

    assert_eq!(Command::from_frame(&frame), Some(Command::Activate { interval_ms: 60_000 }));
}

#[test]
fn test_unknown_verb() {
    assert_eq!(Command::from_frame(&CommandFrame::parse(b"LED,1")), None);
    assert_eq!(Command::from_frame(&CommandFrame::parse(b"blaeck.write_data")), None);
}

#[test]
fn test_to_frame() {
    assert_eq!(
        Command::WriteSymbols { message_id: 7 }.to_frame(),
        "<BLAECK.WRITE_SYMBOLS,7,0,0,0>"
    );
    assert_eq!(
        Command::Activate { interval_ms: 1000 }.to_frame(),
        format!("<{},232,3,0,0>", VERB_ACTIVATE)
    );
    assert_eq!(Command::Deactivate.to_frame(), "<BLAECK.DEACTIVATE>");
}

#[test]
fn test_to_frame_parses_back() {
    let command = Command::GetDevices { message_id: 0xDEAD_BEEF };
    let text = command.to_frame();

    let frame = CommandFrame::parse(text.trim_start_matches('<').trim_end_matches('>').as_bytes());

    assert_eq!(Command::from_frame(&frame), Some(command));
    assert_ne!(command.verb(), VERB_WRITE_DATA);
}
