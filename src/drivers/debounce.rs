//! Stable-interval debouncer over any `embedded-hal` input pin.
//!
//! A raw change restarts the interval; the debounced state only follows
//! once the raw level has held for `interval_ms`.  Read errors count as
//! "no change".

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use super::hw_init::{self, HwInitError};
use crate::app::ports::Debouncer;

pub struct PinDebouncer<P: InputPin> {
    pin: P,
    interval_ms: u32,
    debounced: bool,
    unstable: bool,
    last_flip_ms: u32,
    state_since_ms: u32,
}

impl<P: InputPin> PinDebouncer<P> {
    /// Starts in whatever state the pin reads now.
    pub fn new(mut pin: P, interval_ms: u32, now_ms: u32) -> Self {
        let level = pin.is_high().unwrap_or(false);
        Self {
            pin,
            interval_ms,
            debounced: level,
            unstable: level,
            last_flip_ms: now_ms,
            state_since_ms: now_ms,
        }
    }
}

impl<P: InputPin> Debouncer for PinDebouncer<P> {
    fn update(&mut self, now_ms: u32) -> bool {
        let Ok(level) = self.pin.is_high() else {
            return false;
        };

        if level != self.unstable {
            self.unstable = level;
            self.last_flip_ms = now_ms;
            return false;
        }

        if level != self.debounced && now_ms.wrapping_sub(self.last_flip_ms) >= self.interval_ms {
            self.debounced = level;
            self.last_flip_ms = now_ms;
            self.state_since_ms = now_ms;
            return true;
        }
        false
    }

    fn read(&self) -> bool {
        self.debounced
    }

    fn duration(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.state_since_ms)
    }
}

/// A configured GPIO input read through the sys layer.
#[derive(Debug)]
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    pub fn new(pin: i32, pull_up: bool) -> Result<Self, HwInitError> {
        hw_init::configure_input(pin, pull_up)?;
        Ok(Self { pin })
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioInput {
    type Error = Infallible;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(hw_init::gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!hw_init::gpio_read(self.pin))
    }
}
