//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing bus diagnostics to the ESP-IDF
//! logger (the console UART, never the host link).

use log::{debug, info, warn};

use crate::app::events::BusEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BusEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    dropped: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { dropped: 0 }
    }

    /// Frames discarded since boot (unknown, timed out or rejected).
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BusEvent) {
        match event {
            BusEvent::Ready { modules } => {
                info!("BUS | ready, modules={}", modules);
            }
            BusEvent::UnknownOpcode(op) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("DROP | unknown opcode 0x{:02X}", op);
            }
            BusEvent::FrameTimedOut {
                opcode,
                received,
                expected,
            } => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!(
                    "DROP | {:?} timed out after {}/{} payload bytes",
                    *opcode as char, received, expected
                );
            }
            BusEvent::CommandApplied { opcode, module } => {
                debug!("CMD | {:?} -> {}", *opcode as char, module);
            }
            BusEvent::CommandRejected {
                opcode,
                module,
                reason,
            } => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("DROP | {:?} rejected by {}: {:?}", *opcode as char, module, reason);
            }
            BusEvent::Reported { modules } => {
                debug!("REPORT | {} modules", modules);
            }
        }
    }
}
