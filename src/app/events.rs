//! Outbound diagnostic events.
//!
//! The [`BusService`](super::service::BusService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The wire protocol has no
//! error report, so dropped frames and rejected commands only surface here.

use crate::modules::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Every module finished `setup()`.
    Ready { modules: usize },

    /// An opcode byte with no registered module was discarded.
    UnknownOpcode(u8),

    /// The host stopped mid-frame; the partial frame was discarded.
    FrameTimedOut {
        opcode: u8,
        received: usize,
        expected: usize,
    },

    /// A module accepted and applied a command.
    CommandApplied { opcode: u8, module: &'static str },

    /// A module dropped a command without acknowledging it.
    CommandRejected {
        opcode: u8,
        module: &'static str,
        reason: Rejection,
    },

    /// A full report of every module was written.
    Reported { modules: usize },
}
