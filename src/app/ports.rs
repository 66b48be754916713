//! Port traits: the boundary between bus logic and the outside world.
//!
//! ```text
//!   Adapter / driver ──▶ Port trait ──▶ modules, dispatcher, BusService
//! ```
//!
//! Hardware drivers (GPIO debouncers, LEDC servos, the system timer) and
//! diagnostic sinks implement these traits.  Modules consume them via
//! generics, so nothing above this line touches a register.

use super::events::BusEvent;
use crate::channel::ChannelId;
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
///
/// Both counters wrap at `u32::MAX`; every consumer compares them with
/// `wrapping_sub`, never with `<`.
pub trait Clock {
    /// Microseconds since boot, wrapping.
    fn now_us(&self) -> u32;

    /// Milliseconds since boot, wrapping.
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Debouncer port (digital inputs)
// ───────────────────────────────────────────────────────────────

/// A debounced digital input.
pub trait Debouncer {
    /// Sample the input.  Returns `true` when the debounced state changed.
    fn update(&mut self, now_ms: u32) -> bool;

    /// Current debounced state (`true` = high).
    fn read(&self) -> bool;

    /// Milliseconds spent in the current debounced state.
    fn duration(&self, now_ms: u32) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Servo output port
// ───────────────────────────────────────────────────────────────

/// A PWM servo output.
pub trait ServoOutput {
    /// Bind the output to a pin and start generating pulses.
    fn attach(&mut self, pin: i32) -> Result<()>;

    /// Command a position.  Values below 544 are degrees, larger values
    /// are pulse widths in microseconds.
    fn write(&mut self, value: u16);

    /// Last commanded value.
    fn read(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Edge interrupt port
// ───────────────────────────────────────────────────────────────

/// Hooks GPIO edge interrupts up to bound arena slots.
pub trait EdgeInterrupts {
    /// Route both edges of `pin` to the arena slot `id`.  Called once per
    /// channel at setup; handlers are never detached.
    fn attach(&mut self, pin: i32, id: ChannelId) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// Receives bus diagnostics.  Adapters decide where they go (log, RTT,
/// a counter); nothing here ever reaches the host link.
pub trait EventSink {
    fn emit(&mut self, event: &BusEvent);
}
