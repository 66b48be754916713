//! Edge-timed pulse measurement (RC receivers, servo feedback).
//!
//! ```text
//!   C<letter><idx><width µs:4 hex>   new width measured
//!   R<letter><idx><width µs:4 hex>   full report
//! ```
//!
//! Pulse-in and servo-in are both this module; only the letter and pins
//! differ.

use heapless::Vec;
use log::{debug, info};

use super::Module;
use crate::app::ports::EdgeInterrupts;
use crate::channel::{EdgeArena, PulseChannel};
use crate::config::{MAX_CHANNELS, PulseInConfig};
use crate::error::{Error, Result};
use crate::protocol::index_to_wire;
use crate::protocol::report::{Line, LineSink};

#[derive(Debug, Clone, Copy)]
struct PulseInput {
    channel: PulseChannel,
    /// Last width sent in a change report.
    reported: u16,
}

pub struct PulseInModule<'a, E: EdgeInterrupts> {
    name: &'static str,
    letter: u8,
    arena: &'a EdgeArena,
    interrupts: E,
    index_offset: u8,
    pins: Vec<i32, MAX_CHANNELS>,
    initial_width_us: u16,
    max_width_us: u16,
    inputs: Vec<PulseInput, MAX_CHANNELS>,
}

impl<'a, E: EdgeInterrupts> PulseInModule<'a, E> {
    pub fn new(
        name: &'static str,
        config: &PulseInConfig,
        index_offset: u8,
        arena: &'a EdgeArena,
        interrupts: E,
    ) -> Self {
        Self {
            name,
            letter: config.letter_byte(),
            arena,
            interrupts,
            index_offset,
            pins: config.pins.clone(),
            initial_width_us: config.initial_width_us,
            max_width_us: config.max_width_us,
            inputs: Vec::new(),
        }
    }

    /// RC receiver channels.
    pub fn pulse_in(config: &PulseInConfig, index_offset: u8, arena: &'a EdgeArena, interrupts: E) -> Self {
        Self::new("pulse_in", config, index_offset, arena, interrupts)
    }

    /// Servo position feedback.
    pub fn servo_in(config: &PulseInConfig, index_offset: u8, arena: &'a EdgeArena, interrupts: E) -> Self {
        Self::new("servo_in", config, index_offset, arena, interrupts)
    }

    pub fn letter(&self) -> u8 {
        self.letter
    }

    /// Current width of channel `index`, if bound.
    pub fn width(&self, index: usize) -> Option<u16> {
        self.inputs.get(index).map(|p| p.channel.last_width())
    }
}

impl<E: EdgeInterrupts> Module for PulseInModule<'_, E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn setup(&mut self) -> Result<()> {
        self.inputs.clear();
        for &pin in &self.pins {
            let id = self.arena.bind(pin)?;
            self.interrupts.attach(pin, id)?;
            let channel = PulseChannel::new(id, self.initial_width_us, self.max_width_us);
            self.inputs
                .push(PulseInput {
                    channel,
                    reported: self.initial_width_us,
                })
                .map_err(|_| Error::TooManyChannels(self.name))?;
        }
        info!(
            "{}: {} channels, letter {:?}, initial {} us",
            self.name,
            self.inputs.len(),
            self.letter as char,
            self.initial_width_us
        );
        Ok(())
    }

    fn update(&mut self, _now_ms: u32, out: &mut dyn LineSink) {
        for (i, input) in self.inputs.iter_mut().enumerate() {
            let Some(width) = input.channel.poll(self.arena) else {
                continue;
            };
            if width == input.reported {
                continue;
            }
            debug!("{}[{}]: {} -> {} us", self.name, i, input.reported, width);
            input.reported = width;
            let index = index_to_wire(i, self.index_offset);
            out.send(&Line::change(self.letter, index).hex_u16(width));
        }
    }

    fn report(&mut self, _now_ms: u32, out: &mut dyn LineSink) {
        for (i, input) in self.inputs.iter().enumerate() {
            let index = index_to_wire(i, self.index_offset);
            out.send(&Line::full(self.letter, index).hex_u16(input.channel.last_width()));
        }
    }
}
