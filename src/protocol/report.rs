//! Outbound line encoder.
//!
//! Every module formats its status through [`Line`] so all report shapes
//! stay byte-for-byte consistent:
//!
//! ```text
//! ┌───┬────────┬───────┬───────────────┬──────────────┐
//! │ C │ letter │ index │ value (hex)   │              │  change report
//! │ R │ letter │ index │ value (hex)   │ extra fields │  full report
//! ├───┴────────┴───────┴───────────────┴──────────────┤
//! │ opcode + payload echoed verbatim, then ACK (0x06) │  acknowledgement
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! The `\r\n` terminator is appended by the sink, never stored in the line.

use heapless::Vec;

use super::codec::Frame;
use super::hex;
use super::ACK;

/// Capacity of one outbound line, excluding the terminator.
pub const LINE_CAP: usize = 48;

/// One outbound line under construction.
///
/// Builders silently truncate at [`LINE_CAP`]; no report shape in the
/// protocol comes close.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    buf: Vec<u8, LINE_CAP>,
}

impl Line {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Start a change report: `C<module><index>`.
    pub fn change(module: u8, index_byte: u8) -> Self {
        Self::new().raw(b'C').raw(module).raw(index_byte)
    }

    /// Start a full report: `R<module><index>`.
    pub fn full(module: u8, index_byte: u8) -> Self {
        Self::new().raw(b'R').raw(module).raw(index_byte)
    }

    /// Acknowledge a processed command by echoing it followed by ACK.
    pub fn ack(frame: &Frame) -> Self {
        Self::new().raw(frame.opcode()).bytes(frame.payload()).raw(ACK)
    }

    /// Free-form text line (boot banner).
    pub fn text(text: &str) -> Self {
        Self::new().bytes(text.as_bytes())
    }

    /// Append one byte unchanged.
    pub fn raw(mut self, byte: u8) -> Self {
        let _ = self.buf.push(byte);
        self
    }

    /// Append a byte slice unchanged.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        for &b in bytes {
            if self.buf.push(b).is_err() {
                break;
            }
        }
        self
    }

    /// Append a boolean as ASCII `'0'` / `'1'`.
    pub fn flag(self, state: bool) -> Self {
        self.raw(if state { b'1' } else { b'0' })
    }

    pub fn hex_u8(self, value: u8) -> Self {
        self.bytes(&hex::encode_u8(value))
    }

    pub fn hex_u16(self, value: u16) -> Self {
        self.bytes(&hex::encode_u16(value))
    }

    pub fn hex_u32(self, value: u32) -> Self {
        self.bytes(&hex::encode_u32(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Destination for outbound lines.
///
/// Modules only ever see this trait; the bus decides where lines go
/// (the serial transport in production, a recorder in tests).
pub trait LineSink {
    fn send(&mut self, line: &Line);
}
