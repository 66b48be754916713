//! I/O modules and the uniform lifecycle they share.
//!
//! | Module       | Letter | Opcodes          | Polled state          |
//! |--------------|--------|------------------|-----------------------|
//! | `digital_in` | `D`    | -                | debounced inputs      |
//! | `pulse_in`   | `S`/`V`| -                | RC pulse widths       |
//! | `servo_out`  | -      | `S` (2), `s` (5) | -                     |
//!
//! Pulse-in and servo-in are the same [`pulse_in::PulseInModule`] with a
//! different letter and initial width.
//!
//! The bus treats every module identically: `setup()` once at boot,
//! `update()` every loop iteration, `report()` on demand, and
//! `process_command()` for frames whose opcode the module declared in
//! [`Module::commands`].

pub mod digital_in;
pub mod pulse_in;
pub mod servo_out;

use crate::error::Result;
use crate::protocol::codec::Frame;
use crate::protocol::report::LineSink;

/// One opcode a module accepts and the payload length it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub opcode: u8,
    pub payload_len: usize,
}

impl CommandSpec {
    pub const fn new(opcode: u8, payload_len: usize) -> Self {
        Self {
            opcode,
            payload_len,
        }
    }
}

/// Why a module dropped a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The index byte does not name a channel of this module.
    IndexOutOfRange(u8),
    /// A hex field contained a non-hex character.
    InvalidHex,
    /// The module does not handle this opcode.
    NotSupported,
}

/// What a module did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Applied and acknowledged.
    Applied,
    /// Dropped silently: nothing was written to the host.
    Rejected(Rejection),
}

/// The lifecycle contract every I/O module implements.
pub trait Module {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Opcodes routed to this module.  Modules without commands keep the
    /// default empty list.
    fn commands(&self) -> &'static [CommandSpec] {
        &[]
    }

    /// Configure pins and hardware once at boot.
    fn setup(&mut self) -> Result<()>;

    /// Called every loop iteration.  Emits change reports for anything
    /// that changed since the last call.
    fn update(&mut self, now_ms: u32, out: &mut dyn LineSink);

    /// Emit a full report line for every channel.
    fn report(&mut self, now_ms: u32, out: &mut dyn LineSink);

    /// Handle one complete frame for an opcode from [`Module::commands`].
    fn process_command(&mut self, _frame: &Frame, _out: &mut dyn LineSink) -> CommandResult {
        CommandResult::Rejected(Rejection::NotSupported)
    }
}
