//! Fuzz target: `FrameParser::feed`
//!
//! Drives arbitrary byte sequences into the streaming MCU frame parser and
//! asserts that it never panics, never yields a frame whose checksum does
//! not verify, and never holds more than one maximal frame.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::link::codec::{FrameParser, ParseEvent, encode_frame};
use petfeeder::link::frame::{MAX_FRAME_LEN, checksum};

fuzz_target!(|data: &[u8]| {
    let mut parser = FrameParser::new();

    parser.feed(data, |event| {
        if let ParseEvent::Frame(f) = event {
            let bytes = encode_frame(f.target, f.source, f.command, &f.payload)
                .expect("decoded frame must re-encode");
            let (body, sum) = bytes.split_at(bytes.len() - 1);
            assert_eq!(checksum(body), sum[0], "decoder yielded a bad checksum");
        }
    });
    assert!(parser.buffered() < MAX_FRAME_LEN, "parser buffer overran");

    // After a reset the parser must accept bytes cleanly again.
    parser.reset();
    parser.feed(data, |_| {});
});
