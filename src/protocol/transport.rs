//! Transport abstraction: the serial byte stream to the host.
//!
//! Concrete implementations:
//! - UART (`drivers::uart::UartTransport`)
//! - in-memory queues in tests
//!
//! The dispatcher and every module are generic over `Transport`, so a new
//! link (USB CDC, TCP bridge) needs no protocol changes.

use log::warn;

use super::report::{Line, LineSink};
use super::TERMINATOR;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;

    /// Non-blocking single-byte read.  Read errors count as "no byte".
    fn read_byte(&mut self) -> Option<u8> {
        let mut b = [0u8; 1];
        match self.read(&mut b) {
            Ok(1) => Some(b[0]),
            Ok(_) => None,
            Err(e) => {
                warn!("transport: read failed: {:?}", e);
                None
            }
        }
    }
}

/// [`LineSink`] that writes terminated lines to a transport.
///
/// Write errors are logged and the line dropped; the protocol has no way to
/// tell the host that a report went missing.
pub struct SerialSink<'t, T: Transport> {
    transport: &'t mut T,
}

impl<'t, T: Transport> SerialSink<'t, T> {
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), T::Error> {
        while !data.is_empty() {
            let n = self.transport.write(data)?;
            if n == 0 {
                break;
            }
            data = &data[n..];
        }
        Ok(())
    }
}

impl<T: Transport> LineSink for SerialSink<'_, T> {
    fn send(&mut self, line: &Line) {
        let result = self
            .write_all(line.as_bytes())
            .and_then(|()| self.write_all(TERMINATOR))
            .and_then(|()| self.transport.flush());
        if let Err(e) = result {
            warn!("transport: dropped line ({} bytes): {:?}", line.as_bytes().len(), e);
        }
    }
}
