//! Fuzz target: `FixedFrameDecoder::push`
//!
//! Drives arbitrary byte streams into the fixed-length frame decoder with
//! the servo-out opcodes declared, and checks that every completed frame
//! carries exactly the payload length its opcode declares.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use ardubus::protocol::codec::{Decoded, DecoderState, FixedFrameDecoder, FrameDecoder};
use ardubus::protocol::{is_separator, MAX_PAYLOAD};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FixedFrameDecoder::new();
    decoder.declare(b'S', 2).unwrap();
    decoder.declare(b's', 5).unwrap();
    decoder.declare(b'Z', 0).unwrap();

    for &byte in data {
        let before = decoder.state();
        match decoder.push(byte) {
            Decoded::Frame(frame) => {
                let expected = decoder.payload_len(frame.opcode()).unwrap();
                assert_eq!(frame.payload().len(), expected);
                assert!(frame.payload().len() <= MAX_PAYLOAD);
                assert_eq!(decoder.state(), DecoderState::AwaitingOpcode);
            }
            Decoded::Separator => {
                assert!(is_separator(byte));
                assert_eq!(before, DecoderState::AwaitingOpcode);
            }
            Decoded::Unknown(op) => {
                assert_eq!(op, byte);
                assert!(decoder.payload_len(op).is_none());
            }
            Decoded::Pending => {
                assert!(matches!(decoder.state(), DecoderState::AwaitingPayload { .. }));
            }
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert_eq!(decoder.state(), DecoderState::AwaitingOpcode);
});
