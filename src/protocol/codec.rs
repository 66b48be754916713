//! Command frame decoding.
//!
//! Wire format (host → device):
//! ```text
//! ┌─────────────┬────────────────────────────┐
//! │ Opcode (1B) │ Payload (N B, N per opcode)│
//! └─────────────┴────────────────────────────┘
//! ```
//!
//! There is no length prefix and no checksum: frame boundaries are implied
//! by the payload length each opcode declares.  The decoder therefore has
//! to know every registered opcode up front.  An unknown opcode byte is
//! discarded on its own; its payload (if the host sent one) is then read
//! as a stream of further opcodes, so the link can stay out of step until
//! the host pauses or a separator realigns it.  That is a property of the
//! framing, not something the decoder can repair.
//!
//! Framing is kept behind [`FrameDecoder`] so a different scheme could be
//! swapped in without touching the dispatcher or any module.

use heapless::Vec;

use super::{is_separator, MAX_PAYLOAD};
use crate::error::{Error, Result};

/// Maximum number of distinct opcodes across all modules.
pub const MAX_OPCODES: usize = 16;

/// One complete command: opcode plus its fixed-length payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    opcode: u8,
    payload: Vec<u8, MAX_PAYLOAD>,
}

impl Frame {
    /// Build a frame from raw parts.  `None` if the payload is too long.
    pub fn new(opcode: u8, payload: &[u8]) -> Option<Self> {
        Some(Self {
            opcode,
            payload: Vec::from_slice(payload).ok()?,
        })
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// The next byte is expected to be an opcode.
    AwaitingOpcode,
    /// An opcode was accepted; `collected` of `expected` payload bytes are in.
    AwaitingPayload {
        opcode: u8,
        expected: usize,
        collected: usize,
    },
}

/// Result of feeding one byte into a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Byte consumed, frame not complete yet.
    Pending,
    /// A separator (CR/LF) between frames was skipped.
    Separator,
    /// Byte was in opcode position but nothing is registered for it.
    Unknown(u8),
    /// A complete frame.
    Frame(Frame),
}

/// Streaming, byte-at-a-time command decoder.
pub trait FrameDecoder {
    /// Tell the decoder that `opcode` carries `payload_len` bytes.
    ///
    /// Called once per opcode while the bus is being assembled.
    fn declare(&mut self, opcode: u8, payload_len: usize) -> Result<()>;

    /// Feed one byte.
    fn push(&mut self, byte: u8) -> Decoded;

    /// Drop any partial frame and wait for the next opcode.
    fn reset(&mut self);

    fn state(&self) -> DecoderState;
}

/// Decoder for the fixed-length, unframed arDuBUS command format.
pub struct FixedFrameDecoder {
    lengths: Vec<(u8, usize), MAX_OPCODES>,
    state: DecoderState,
    payload: Vec<u8, MAX_PAYLOAD>,
}

impl Default for FixedFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedFrameDecoder {
    pub fn new() -> Self {
        Self {
            lengths: Vec::new(),
            state: DecoderState::AwaitingOpcode,
            payload: Vec::new(),
        }
    }

    /// Declared payload length for `opcode`, if registered.
    pub fn payload_len(&self, opcode: u8) -> Option<usize> {
        self.lengths
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|&(_, len)| len)
    }

    fn start_frame(&mut self, opcode: u8, expected: usize) -> Decoded {
        self.payload.clear();
        if expected == 0 {
            return Decoded::Frame(Frame {
                opcode,
                payload: Vec::new(),
            });
        }
        self.state = DecoderState::AwaitingPayload {
            opcode,
            expected,
            collected: 0,
        };
        Decoded::Pending
    }
}

impl FrameDecoder for FixedFrameDecoder {
    fn declare(&mut self, opcode: u8, payload_len: usize) -> Result<()> {
        if is_separator(opcode) {
            return Err(Error::ReservedOpcode(opcode));
        }
        if payload_len > MAX_PAYLOAD {
            return Err(Error::PayloadTooLong {
                opcode,
                len: payload_len,
            });
        }
        if self.payload_len(opcode).is_some() {
            return Err(Error::DuplicateOpcode(opcode));
        }
        self.lengths
            .push((opcode, payload_len))
            .map_err(|_| Error::TooManyRoutes)
    }

    fn push(&mut self, byte: u8) -> Decoded {
        match self.state {
            DecoderState::AwaitingOpcode => {
                if is_separator(byte) {
                    return Decoded::Separator;
                }
                match self.payload_len(byte) {
                    Some(expected) => self.start_frame(byte, expected),
                    None => Decoded::Unknown(byte),
                }
            }

            DecoderState::AwaitingPayload {
                opcode,
                expected,
                collected,
            } => {
                // Capacity is guaranteed by the MAX_PAYLOAD check in declare().
                let _ = self.payload.push(byte);
                let collected = collected + 1;

                if collected < expected {
                    self.state = DecoderState::AwaitingPayload {
                        opcode,
                        expected,
                        collected,
                    };
                    return Decoded::Pending;
                }

                self.state = DecoderState::AwaitingOpcode;
                let payload = core::mem::take(&mut self.payload);
                Decoded::Frame(Frame { opcode, payload })
            }
        }
    }

    fn reset(&mut self) {
        self.state = DecoderState::AwaitingOpcode;
        self.payload.clear();
    }

    fn state(&self) -> DecoderState {
        self.state
    }
}
