//! Debounced digital inputs.
//!
//! ```text
//!   CD<idx><0|1>                 state changed
//!   RD<idx><0|1><ms:8 hex>       full report: state and time held
//! ```

use heapless::Vec;
use log::info;

use super::Module;
use crate::app::ports::Debouncer;
use crate::config::MAX_CHANNELS;
use crate::error::{Error, Result};
use crate::protocol::index_to_wire;
use crate::protocol::report::{Line, LineSink};

/// Report letter.
pub const LETTER: u8 = b'D';

pub struct DigitalInModule<D: Debouncer> {
    inputs: Vec<D, MAX_CHANNELS>,
    index_offset: u8,
    update_interval_ms: u32,
    last_update_ms: Option<u32>,
}

impl<D: Debouncer> DigitalInModule<D> {
    /// `inputs` in wire index order.
    pub fn new(
        inputs: impl IntoIterator<Item = D>,
        index_offset: u8,
        update_interval_ms: u32,
    ) -> Result<Self> {
        let mut list = Vec::new();
        for input in inputs {
            list.push(input)
                .map_err(|_| Error::TooManyChannels("digital_in"))?;
        }
        Ok(Self {
            inputs: list,
            index_offset,
            update_interval_ms,
            last_update_ms: None,
        })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    fn due(&mut self, now_ms: u32) -> bool {
        match self.last_update_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.update_interval_ms => false,
            _ => {
                self.last_update_ms = Some(now_ms);
                true
            }
        }
    }
}

impl<D: Debouncer> Module for DigitalInModule<D> {
    fn name(&self) -> &'static str {
        "digital_in"
    }

    fn setup(&mut self) -> Result<()> {
        info!("digital_in: {} inputs", self.inputs.len());
        Ok(())
    }

    fn update(&mut self, now_ms: u32, out: &mut dyn LineSink) {
        if !self.due(now_ms) {
            return;
        }
        for (i, input) in self.inputs.iter_mut().enumerate() {
            if input.update(now_ms) {
                let index = index_to_wire(i, self.index_offset);
                out.send(&Line::change(LETTER, index).flag(input.read()));
            }
        }
    }

    fn report(&mut self, now_ms: u32, out: &mut dyn LineSink) {
        for (i, input) in self.inputs.iter().enumerate() {
            let index = index_to_wire(i, self.index_offset);
            out.send(
                &Line::full(LETTER, index)
                    .flag(input.read())
                    .hex_u32(input.duration(now_ms)),
            );
        }
    }
}
