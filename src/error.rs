//! Unified error types for the arDuBUS firmware.
//!
//! Errors only exist at setup time: registering modules, binding edge
//! channels, validating the board configuration and bringing up
//! peripherals.  Once the bus is running nothing is fatal; dropped frames
//! and rejected commands are reported as [`BusEvent`](crate::app::events::BusEvent)s
//! instead.  All variants are `Copy` so they pass through setup code
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Two modules tried to claim the same opcode byte.
    DuplicateOpcode(u8),
    /// The opcode is a frame separator (CR/LF) and cannot be registered.
    ReservedOpcode(u8),
    /// A command declares more payload bytes than a frame can hold.
    PayloadTooLong { opcode: u8, len: usize },
    /// The opcode routing table is full.
    TooManyRoutes,
    /// The bus cannot hold another module.
    TooManyModules,
    /// Every slot in the edge-timer arena is already bound.
    ArenaExhausted,
    /// A module was configured with more channels than it can hold.
    TooManyChannels(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOpcode(op) => {
                write!(f, "opcode {:?} (0x{:02X}) registered twice", *op as char, op)
            }
            Self::ReservedOpcode(op) => write!(f, "opcode 0x{:02X} is a frame separator", op),
            Self::PayloadTooLong { opcode, len } => {
                write!(f, "opcode {:?} declares {} payload bytes", *opcode as char, len)
            }
            Self::TooManyRoutes => write!(f, "opcode routing table full"),
            Self::TooManyModules => write!(f, "module registry full"),
            Self::ArenaExhausted => write!(f, "edge arena exhausted"),
            Self::TooManyChannels(module) => write!(f, "{}: too many channels", module),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
