//! Edge timestamp capture, shared between GPIO interrupts and the main loop.
//!
//! Every monitored pin owns one slot in a fixed-size arena.  Slots are bound
//! once at setup and the arena never grows, so an interrupt handler only
//! needs the slot's [`ChannelId`] (passed as the ISR argument) to find it.
//!
//! | Writer         | Fields                                  |
//! |----------------|-----------------------------------------|
//! | rising ISR     | `rising_us`, clears `has_new_sample`    |
//! | falling ISR    | `falling_us`, sets `has_new_sample`     |
//! | main loop      | `taken_seq` via take_sample             |
//!
//! No lock is taken in interrupt context.  Each slot is a sequence lock
//! built from `AtomicU32`s: the ISR makes `seq` odd, writes, then makes it
//! even again.  [`ChannelArena::take_sample`] retries until it reads the
//! flag and both timestamps under one unchanged even `seq`, so the main
//! loop sees a pair from the same pulse or nothing.  The ISR never waits
//! on the main loop.
//!
//! Consuming a sample does not write the ISR's fields.  The main loop
//! records the `seq` it consumed; the sample is new only while `seq` still
//! differs from it.
//!
//! ## Accuracy
//!
//! Timestamps are taken when the handler runs, not when the edge happened.
//! Pulses shorter than interrupt latency can lose an edge entirely; a
//! falling edge with no preceding rising edge then pairs with a stale
//! rising timestamp.  [`PulseChannel`](super::PulseChannel) discards the
//! resulting implausible widths.

use core::hint::spin_loop;
use core::sync::atomic::{fence, AtomicBool, AtomicI32, AtomicU32, AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Maximum number of edge-timed pins across all modules.
pub const MAX_EDGE_CHANNELS: usize = 16;

/// The arena size used by the firmware.
pub type EdgeArena = ChannelArena<MAX_EDGE_CHANNELS>;

/// Stable index of a bound slot.  Fits in an ISR `void *` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId(u8);

impl ChannelId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Rebuild an id from an ISR argument.
    pub fn from_raw(raw: usize) -> Self {
        Self(raw as u8)
    }
}

/// A completed rising → falling pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePair {
    pub rising_us: u32,
    pub falling_us: u32,
}

impl EdgePair {
    /// Pulse width in microseconds, modulo timer wrap.
    pub fn width_us(&self) -> u32 {
        self.falling_us.wrapping_sub(self.rising_us)
    }
}

struct EdgeSlot {
    pin: AtomicI32,
    /// Odd while an ISR is writing.
    seq: AtomicU32,
    rising_us: AtomicU32,
    falling_us: AtomicU32,
    has_new_sample: AtomicBool,
    /// `seq` of the last sample the main loop took.
    taken_seq: AtomicU32,
}

impl EdgeSlot {
    const fn new() -> Self {
        Self {
            pin: AtomicI32::new(-1),
            seq: AtomicU32::new(0),
            rising_us: AtomicU32::new(0),
            falling_us: AtomicU32::new(0),
            has_new_sample: AtomicBool::new(false),
            taken_seq: AtomicU32::new(0),
        }
    }

    /// Single writer: edges of one pin never overlap.
    fn write(&self, f: impl FnOnce(&Self)) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        f(self);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }
}

/// Fixed arena of edge slots, usable from a `static`.
pub struct ChannelArena<const N: usize> {
    slots: [EdgeSlot; N],
    bound: AtomicUsize,
}

impl<const N: usize> Default for ChannelArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChannelArena<N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { EdgeSlot::new() }; N],
            bound: AtomicUsize::new(0),
        }
    }

    /// Slot for `pin`, claiming the next free one if the pin is new.
    ///
    /// Binding the same pin again returns the same id, so a module can be
    /// set up more than once.  Setup context only.
    pub fn bind(&self, pin: i32) -> Result<ChannelId> {
        if let Some(id) = self.find(pin) {
            return Ok(id);
        }
        let index = self.bound.load(Ordering::Acquire);
        if index >= N || index > usize::from(u8::MAX) {
            return Err(Error::ArenaExhausted);
        }
        self.slots[index].pin.store(pin, Ordering::Relaxed);
        self.bound.store(index + 1, Ordering::Release);
        Ok(ChannelId(index as u8))
    }

    /// Bound slot for `pin`, if any.
    pub fn find(&self, pin: i32) -> Option<ChannelId> {
        self.bound_slots()
            .iter()
            .position(|slot| slot.pin.load(Ordering::Relaxed) == pin)
            .map(|index| ChannelId(index as u8))
    }

    /// Number of bound slots.
    pub fn len(&self) -> usize {
        self.bound.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pin a slot was bound to.
    pub fn pin(&self, id: ChannelId) -> Option<i32> {
        self.slot(id).map(|slot| slot.pin.load(Ordering::Relaxed))
    }

    /// Rising edge at `now_us`.  Interrupt context.
    pub fn on_rising(&self, id: ChannelId, now_us: u32) {
        if let Some(slot) = self.slot(id) {
            slot.write(|s| {
                s.rising_us.store(now_us, Ordering::Relaxed);
                s.has_new_sample.store(false, Ordering::Relaxed);
            });
        }
    }

    /// Falling edge at `now_us`.  Interrupt context.
    pub fn on_falling(&self, id: ChannelId, now_us: u32) {
        if let Some(slot) = self.slot(id) {
            slot.write(|s| {
                s.falling_us.store(now_us, Ordering::Relaxed);
                s.has_new_sample.store(true, Ordering::Relaxed);
            });
        }
    }

    /// Dispatch an any-edge interrupt by the level read after the edge.
    pub fn on_edge(&self, id: ChannelId, level_high: bool, now_us: u32) {
        if level_high {
            self.on_rising(id, now_us);
        } else {
            self.on_falling(id, now_us);
        }
    }

    /// Read and consume a completed pair in one step.
    ///
    /// `None` when no falling edge arrived since the last take.  Main loop
    /// only.
    pub fn take_sample(&self, id: ChannelId) -> Option<EdgePair> {
        let slot = self.slot(id)?;
        loop {
            let before = slot.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                spin_loop();
                continue;
            }
            let fresh = slot.has_new_sample.load(Ordering::Relaxed);
            let pair = EdgePair {
                rising_us: slot.rising_us.load(Ordering::Relaxed),
                falling_us: slot.falling_us.load(Ordering::Relaxed),
            };
            fence(Ordering::Acquire);
            if slot.seq.load(Ordering::Relaxed) != before {
                continue;
            }

            if !fresh || slot.taken_seq.load(Ordering::Relaxed) == before {
                return None;
            }
            slot.taken_seq.store(before, Ordering::Relaxed);
            return Some(pair);
        }
    }

    fn bound_slots(&self) -> &[EdgeSlot] {
        &self.slots[..self.len().min(N)]
    }

    fn slot(&self, id: ChannelId) -> Option<&EdgeSlot> {
        self.bound_slots().get(id.index())
    }
}
