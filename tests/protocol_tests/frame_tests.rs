//! Tests for FrameParser
//!
//! These tests verify:
//! - Extraction of `<...>` frames from a byte stream
//! - Noise between frames is ignored
//! - Truncation at capacity
//! - One frame per feed call, remainder kept

use blaeck_tcp::protocol::{FrameParser, ParserState, DEFAULT_FRAME_CAPACITY};
use bytes::BytesMut;

// =============================================================================
// Helper Functions
// =============================================================================

fn push_all(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Vec<u8>> {
    bytes
        .iter()
        .filter_map(|&b| parser.push(b))
        .map(|f| f.as_bytes().to_vec())
        .collect()
}

// =============================================================================
// Basic Tests
// =============================================================================

#[test]
fn test_simple_frame() {
    let mut parser = FrameParser::default();

    let frames = push_all(&mut parser, b"<A,1,2>");

    assert_eq!(frames, vec![b"A,1,2".to_vec()]);
    assert_eq!(parser.state(), ParserState::Idle);
}

#[test]
fn test_noise_outside_frames_ignored() {
    let mut parser = FrameParser::default();

    let frames = push_all(&mut parser, b"xx>yy<ONE>\r\n junk <TWO>");

    assert_eq!(frames, vec![b"ONE".to_vec(), b"TWO".to_vec()]);
}

#[test]
fn test_empty_frame() {
    let mut parser = FrameParser::default();

    let frames = push_all(&mut parser, b"<>");

    assert_eq!(frames, vec![Vec::<u8>::new()]);
}

#[test]
fn test_start_marker_inside_frame_is_content() {
    let mut parser = FrameParser::default();

    let frames = push_all(&mut parser, b"<A<B>");

    assert_eq!(frames, vec![b"A<B".to_vec()]);
}

#[test]
fn test_partial_frame_survives_between_pushes() {
    let mut parser = FrameParser::default();

    assert!(push_all(&mut parser, b"<BLAECK.WRI").is_empty());
    assert_eq!(parser.state(), ParserState::Capturing);

    let frames = push_all(&mut parser, b"TE_DATA>");
    assert_eq!(frames, vec![b"BLAECK.WRITE_DATA".to_vec()]);
}

#[test]
fn test_reset_drops_partial_frame() {
    let mut parser = FrameParser::default();
    push_all(&mut parser, b"<partial");

    parser.reset();

    assert_eq!(push_all(&mut parser, b"more>"), Vec::<Vec<u8>>::new());
    assert_eq!(parser.state(), ParserState::Idle);
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_truncation_keeps_capacity_minus_one() {
    let mut parser = FrameParser::default();
    let mut input = vec![b'<'];
    input.extend(std::iter::repeat(b'x').take(100));
    input.push(b'>');

    let frame = input.iter().find_map(|&b| parser.push(b)).unwrap();

    assert_eq!(frame.as_bytes().len(), DEFAULT_FRAME_CAPACITY - 1);
    assert!(frame.was_truncated());
}

#[test]
fn test_exactly_fitting_frame_not_truncated() {
    let mut parser = FrameParser::new(4);

    let frame = b"<abc>".iter().find_map(|&b| parser.push(b)).unwrap();

    assert_eq!(frame.as_bytes(), b"abc");
    assert!(!frame.was_truncated());
    assert_eq!(parser.capacity(), 4);
}

#[test]
fn test_truncation_flag_does_not_leak_to_next_frame() {
    let mut parser = FrameParser::new(4);

    let frames: Vec<_> = b"<abcdef><ab>".iter().filter_map(|&b| parser.push(b)).collect();

    assert_eq!(frames[0].as_bytes(), b"abc");
    assert!(frames[0].was_truncated());
    assert_eq!(frames[1].as_bytes(), b"ab");
    assert!(!frames[1].was_truncated());
}

// =============================================================================
// Feed Tests
// =============================================================================

#[test]
fn test_feed_stops_after_first_frame() {
    let mut parser = FrameParser::default();
    let mut input = BytesMut::from(&b"<ONE><TWO>"[..]);

    let first = parser.feed(&mut input).unwrap();
    assert_eq!(first.to_string_lossy(), "ONE");
    assert_eq!(&input[..], b"<TWO>");

    let second = parser.feed(&mut input).unwrap();
    assert_eq!(second.to_string_lossy(), "TWO");
    assert!(input.is_empty());

    assert!(parser.feed(&mut input).is_none());
}

#[test]
fn test_feed_consumes_incomplete_input() {
    let mut parser = FrameParser::default();
    let mut input = BytesMut::from(&b"noise<HALF"[..]);

    assert!(parser.feed(&mut input).is_none());
    assert!(input.is_empty());

    input.extend_from_slice(b">");
    assert_eq!(parser.feed(&mut input).unwrap().as_bytes(), b"HALF");
}
