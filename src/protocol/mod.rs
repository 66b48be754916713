//! arDuBUS serial protocol.
//!
//! Host → device: `<opcode:1 byte><payload:N bytes>`, where `N` is fixed per
//! opcode and declared by the module that owns it.  There is no length
//! prefix and no checksum.
//!
//! Device → host: `\r\n` terminated lines.
//!
//! ```text
//!   C<module><index><value-hex>            change report
//!   R<module><index><value-hex>[<extra>]   full report
//!   <opcode><payload…>\x06                 command acknowledgement
//! ```
//!
//! ```text
//!  Transport ──▶ FrameDecoder ──▶ CommandDispatcher ──▶ Module::process_command
//!                                                             │
//!  Transport ◀──────────────── Line (report encoder) ◀────────┘
//! ```

pub mod codec;
pub mod dispatcher;
pub mod hex;
pub mod report;
pub mod transport;

/// Default offset added to zero-based channel indices on the wire.
///
/// Keeps index bytes clear of CR/LF, which the host libraries treat as
/// line terminators.
pub const DEFAULT_INDEX_OFFSET: u8 = 32;

/// ASCII ACK appended to every command acknowledgement.
pub const ACK: u8 = 0x06;

/// Line terminator for every outbound line.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Largest payload any registered opcode may declare.
pub const MAX_PAYLOAD: usize = 8;

/// Bytes that separate frames rather than start one.
///
/// The host libraries terminate each command with a newline; these are
/// skipped wherever an opcode is expected and may never be registered.
pub const fn is_separator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n')
}

/// Map a wire index byte to a zero-based channel index.
///
/// Returns `None` when the byte lies below the offset or the resulting
/// index is not smaller than `count`.
pub fn wire_to_index(byte: u8, offset: u8, count: usize) -> Option<usize> {
    let index = usize::from(byte.checked_sub(offset)?);
    (index < count).then_some(index)
}

/// Map a zero-based channel index to its wire byte.
pub fn index_to_wire(index: usize, offset: u8) -> u8 {
    offset.wrapping_add(index as u8)
}
