//! Fixed-width hexadecimal encoding used by every report line.
//!
//! All encoders produce uppercase, zero-padded ASCII with no prefix and no
//! separators:
//!
//! | Value | Width   | Example            |
//! |-------|---------|--------------------|
//! | `u8`  | 2 chars | `0x0A` → `"0A"`     |
//! | `u16` | 4 chars | `1500` → `"05DC"`   |
//! | `u32` | 8 chars | `1` → `"00000001"`  |
//!
//! The decoder accepts either case so hosts that lowercase their command
//! payloads still work.

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode the low nibble of `n` as one uppercase ASCII hex digit.
#[inline]
const fn nibble(n: u32) -> u8 {
    DIGITS[(n & 0xF) as usize]
}

/// Encode a byte as two hex digits.
pub const fn encode_u8(value: u8) -> [u8; 2] {
    let v = value as u32;
    [nibble(v >> 4), nibble(v)]
}

/// Encode a 16-bit integer as four hex digits.
pub const fn encode_u16(value: u16) -> [u8; 4] {
    let v = value as u32;
    [nibble(v >> 12), nibble(v >> 8), nibble(v >> 4), nibble(v)]
}

/// Encode a 32-bit unsigned integer as eight hex digits.
pub const fn encode_u32(value: u32) -> [u8; 8] {
    [
        nibble(value >> 28),
        nibble(value >> 24),
        nibble(value >> 20),
        nibble(value >> 16),
        nibble(value >> 12),
        nibble(value >> 8),
        nibble(value >> 4),
        nibble(value),
    ]
}

/// Value of a single ASCII hex digit, either case.
const fn digit_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Decode four ASCII hex digits into a 16-bit integer.
///
/// Returns `None` if any byte is not a hex digit.
pub fn decode_u16(digits: [u8; 4]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &c| {
        digit_value(c).map(|d| (acc << 4) | u16::from(d))
    })
}

/// Decode four hex digits from the start of a payload slice.
///
/// Returns `None` when fewer than four bytes are available or the bytes
/// are not hex digits.
pub fn decode_u16_slice(bytes: &[u8]) -> Option<u16> {
    let digits: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    decode_u16(digits)
}
