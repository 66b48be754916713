//! Pulse-width measurement.
//!
//! ```text
//!   GPIO edge ──▶ edge ISR ──▶ EdgeArena slot ──▶ PulseChannel::poll ──▶ module update()
//!                 (interrupt)   (sequence lock)     (main loop)
//! ```
//!
//! [`edge`] owns the state shared with interrupt context; [`pulse`] is the
//! main-loop side that turns edge pairs into validated widths.

pub mod edge;
pub mod pulse;

pub use edge::{ChannelArena, ChannelId, EdgeArena, EdgePair};
pub use pulse::PulseChannel;
