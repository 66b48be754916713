//! Main-loop view of one edge-timed pin.

use log::trace;

use super::edge::{ChannelArena, ChannelId};

/// Validated pulse-width reading for one channel.
///
/// `last_width` starts at the configured initial width and only ever
/// changes to a plausible measured width; it never resets between reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseChannel {
    id: ChannelId,
    last_width: u16,
    max_width: u16,
}

impl PulseChannel {
    pub fn new(id: ChannelId, initial_width_us: u16, max_width_us: u16) -> Self {
        Self {
            id,
            last_width: initial_width_us,
            max_width: max_width_us,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Most recent valid width in microseconds.
    pub fn last_width(&self) -> u16 {
        self.last_width
    }

    /// Consume a new edge pair if one is waiting.
    ///
    /// `Some` exactly when a falling edge arrived since the previous poll.
    /// A width above `max_width` (typically a missed rising edge) keeps the
    /// previous reading and returns that instead.
    pub fn poll<const N: usize>(&mut self, arena: &ChannelArena<N>) -> Option<u16> {
        let pair = arena.take_sample(self.id)?;
        let width = pair.width_us();
        match u16::try_from(width) {
            Ok(w) if w <= self.max_width => self.last_width = w,
            _ => trace!(
                "pulse[{}]: implausible width {} us, holding {}",
                self.id.index(),
                width,
                self.last_width
            ),
        }
        Some(self.last_width)
    }
}
