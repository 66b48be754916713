//! PWM servo outputs.
//!
//! | Opcode | Payload                  | Value                          |
//! |--------|--------------------------|--------------------------------|
//! | `S`    | `<idx><value:1 byte>`    | degrees                        |
//! | `s`    | `<idx><value:4 hex>`     | degrees, or µs when ≥ 544      |
//!
//! Both are acknowledged by echoing the frame.  No reports.

use heapless::Vec;
use log::info;

use super::{CommandResult, CommandSpec, Module, Rejection};
use crate::app::ports::ServoOutput;
use crate::config::MAX_CHANNELS;
use crate::error::{Error, Result};
use crate::protocol::codec::Frame;
use crate::protocol::report::{Line, LineSink};
use crate::protocol::{hex, wire_to_index};

/// Raw write: index byte, value byte.
pub const OP_WRITE_RAW: u8 = b'S';
/// Hex write: index byte, four hex digits.
pub const OP_WRITE_HEX: u8 = b's';

const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new(OP_WRITE_RAW, 2),
    CommandSpec::new(OP_WRITE_HEX, 5),
];

struct Servo<S> {
    pin: i32,
    output: S,
}

pub struct ServoOutModule<S: ServoOutput> {
    servos: Vec<Servo<S>, MAX_CHANNELS>,
    index_offset: u8,
    initial_position: u16,
}

impl<S: ServoOutput> ServoOutModule<S> {
    /// `outputs` as `(pin, output)` pairs in wire index order.
    pub fn new(
        outputs: impl IntoIterator<Item = (i32, S)>,
        index_offset: u8,
        initial_position: u16,
    ) -> Result<Self> {
        let mut servos = Vec::new();
        for (pin, output) in outputs {
            servos
                .push(Servo { pin, output })
                .map_err(|_| Error::TooManyChannels("servo_out"))?;
        }
        Ok(Self {
            servos,
            index_offset,
            initial_position,
        })
    }

    /// Last value written to servo `index`.
    pub fn position(&self, index: usize) -> Option<u16> {
        self.servos.get(index).map(|s| s.output.read())
    }

    fn decode(&self, frame: &Frame) -> core::result::Result<(usize, u16), Rejection> {
        let Some((&index_byte, value)) = frame.payload().split_first() else {
            return Err(Rejection::NotSupported);
        };
        let index = wire_to_index(index_byte, self.index_offset, self.servos.len())
            .ok_or(Rejection::IndexOutOfRange(index_byte))?;
        let value = match frame.opcode() {
            OP_WRITE_RAW => value.first().map(|&v| u16::from(v)),
            OP_WRITE_HEX => Some(hex::decode_u16_slice(value).ok_or(Rejection::InvalidHex)?),
            _ => None,
        };
        value.map(|v| (index, v)).ok_or(Rejection::NotSupported)
    }
}

impl<S: ServoOutput> Module for ServoOutModule<S> {
    fn name(&self) -> &'static str {
        "servo_out"
    }

    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    fn setup(&mut self) -> Result<()> {
        for servo in &mut self.servos {
            servo.output.attach(servo.pin)?;
            servo.output.write(self.initial_position);
        }
        info!(
            "servo_out: {} servos at {}",
            self.servos.len(),
            self.initial_position
        );
        Ok(())
    }

    fn update(&mut self, _now_ms: u32, _out: &mut dyn LineSink) {}

    fn report(&mut self, _now_ms: u32, _out: &mut dyn LineSink) {}

    fn process_command(&mut self, frame: &Frame, out: &mut dyn LineSink) -> CommandResult {
        match self.decode(frame) {
            Ok((index, value)) => {
                self.servos[index].output.write(value);
                out.send(&Line::ack(frame));
                CommandResult::Applied
            }
            Err(reason) => CommandResult::Rejected(reason),
        }
    }
}
