//! Board configuration
//!
//! Everything that differs between two arDuBUS boards: the name announced
//! in the boot banner, pin lists per module, and protocol timing.  The
//! firmware bakes `config/board.json` in at build time and falls back to
//! [`BoardConfig::default`] (the [`pins`](crate::pins) assignments) when it
//! is missing or malformed.

use heapless::{String, Vec};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::channel::edge::MAX_EDGE_CHANNELS;
use crate::error::{Error, Result};
use crate::pins;
use crate::protocol::DEFAULT_INDEX_OFFSET;

/// Maximum channels per module.
pub const MAX_CHANNELS: usize = 8;

/// Pin list for one module.
pub type PinList = Vec<i32, MAX_CHANNELS>;

/// Board file compiled into the firmware.
const BAKED_BOARD_JSON: &str = include_str!("../config/board.json");

fn pin_list(pins: &[i32]) -> PinList {
    let mut list = PinList::new();
    for &pin in pins.iter().take(MAX_CHANNELS) {
        let _ = list.push(pin);
    }
    list
}

/// Top-level board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Name announced in the boot banner.
    pub board_name: String<32>,
    /// Host link baud rate.
    pub baud_rate: u32,
    /// Added to every zero-based channel index on the wire.
    pub index_offset: u8,
    /// Longest wait for a frame's payload before it is dropped.
    pub command_timeout_ms: u32,
    /// Period of unsolicited full reports.  0 disables them.
    pub report_interval_ms: u32,

    pub digital_in: DigitalInConfig,
    pub servo_out: ServoOutConfig,
    pub pulse_in: PulseInConfig,
    pub servo_in: PulseInConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalInConfig {
    pub pins: PinList,
    /// Input must be stable this long before a change is accepted.
    pub debounce_ms: u32,
    /// Debouncers are sampled at most this often.
    pub update_interval_ms: u32,
    pub pull_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoOutConfig {
    pub pins: PinList,
    /// Position written to every servo at setup.
    pub initial_position: u16,
}

/// Shared by the pulse-in and servo-in modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseInConfig {
    /// Module letter in `C`/`R` reports.
    pub letter: char,
    pub pins: PinList,
    /// Reported before the first pulse arrives.
    pub initial_width_us: u16,
    /// Wider pulses are treated as measurement glitches.
    pub max_width_us: u16,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let mut board_name = String::new();
        let _ = board_name.push_str("ardubus");
        Self {
            board_name,
            baud_rate: pins::BUS_BAUD_RATE,
            index_offset: DEFAULT_INDEX_OFFSET,
            command_timeout_ms: 100,
            report_interval_ms: 5000,
            digital_in: DigitalInConfig::default(),
            servo_out: ServoOutConfig::default(),
            pulse_in: PulseInConfig::pulse_in(),
            servo_in: PulseInConfig::servo_in(),
        }
    }
}

impl Default for DigitalInConfig {
    fn default() -> Self {
        Self {
            pins: pin_list(&pins::DIGITAL_IN_PINS),
            debounce_ms: 20,
            update_interval_ms: 5,
            pull_up: true,
        }
    }
}

impl Default for ServoOutConfig {
    fn default() -> Self {
        Self {
            pins: pin_list(&pins::SERVO_OUT_PINS),
            initial_position: 90,
        }
    }
}

impl Default for PulseInConfig {
    fn default() -> Self {
        Self::pulse_in()
    }
}

impl PulseInConfig {
    /// RC receiver defaults: letter `S`, centred stick.
    pub fn pulse_in() -> Self {
        Self {
            letter: 'S',
            pins: pin_list(&pins::PULSE_IN_PINS),
            initial_width_us: 1500,
            max_width_us: u16::MAX,
        }
    }

    /// Servo feedback defaults: letter `V`.
    pub fn servo_in() -> Self {
        Self {
            letter: 'V',
            pins: pin_list(&pins::SERVO_IN_PINS),
            ..Self::pulse_in()
        }
    }

    /// Report letter as a wire byte.
    pub fn letter_byte(&self) -> u8 {
        u8::try_from(self.letter).unwrap_or(b'?')
    }
}

impl BoardConfig {
    /// Parse and validate a JSON board file.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed board file"))?;
        config.validate()?;
        Ok(config)
    }

    /// The baked-in board file, or defaults if it does not load.
    pub fn load() -> Self {
        match Self::from_json(BAKED_BOARD_JSON) {
            Ok(config) => config,
            Err(e) => {
                warn!("config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Check the invariants the wire protocol depends on.
    pub fn validate(&self) -> Result<()> {
        // Index bytes must never be CR (13) or LF (10).
        if self.index_offset <= b'\r' {
            return Err(Error::Config("index offset must be above 13"));
        }

        let largest = [
            self.digital_in.pins.len(),
            self.servo_out.pins.len(),
            self.pulse_in.pins.len(),
            self.servo_in.pins.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if usize::from(self.index_offset) + largest > usize::from(u8::MAX) {
            return Err(Error::Config("index offset leaves no room for channels"));
        }

        if self.command_timeout_ms == 0 {
            return Err(Error::Config("command timeout must be non-zero"));
        }

        for pulse in [&self.pulse_in, &self.servo_in] {
            if !pulse.letter.is_ascii_alphabetic() {
                return Err(Error::Config("pulse letter must be an ASCII letter"));
            }
            if pulse.initial_width_us > pulse.max_width_us {
                return Err(Error::Config("initial width above max width"));
            }
        }
        if self.pulse_in.letter == self.servo_in.letter
            && !self.pulse_in.pins.is_empty()
            && !self.servo_in.pins.is_empty()
        {
            return Err(Error::Config("pulse-in and servo-in share a report letter"));
        }

        if self.pulse_in.pins.len() + self.servo_in.pins.len() > MAX_EDGE_CHANNELS {
            return Err(Error::Config("more edge-timed pins than the edge arena holds"));
        }

        Ok(())
    }
}
