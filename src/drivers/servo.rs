//! LEDC hobby-servo output.
//!
//! ## Value convention
//!
//! | `write(value)`  | Meaning                                        |
//! |-----------------|------------------------------------------------|
//! | `< 544`         | degrees, clamped to 0–180, mapped to 544–2400 µs |
//! | `≥ 544`         | pulse width in µs, clamped to 544–2400         |
//!
//! The pulse is generated at 50 Hz with 14-bit duty resolution.

use log::debug;

use super::hw_init;
use crate::app::ports::ServoOutput;
use crate::error::Result;
use crate::pins::{
    SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US, SERVO_PWM_FREQ_HZ, SERVO_PWM_RESOLUTION_BITS,
};

/// Pulse width in µs for a `write()` value.
pub fn pulse_width_us(value: u16) -> u16 {
    if value < SERVO_MIN_PULSE_US {
        let degrees = u32::from(value.min(180));
        let span = u32::from(SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US);
        SERVO_MIN_PULSE_US + (degrees * span / 180) as u16
    } else {
        value.clamp(SERVO_MIN_PULSE_US, SERVO_MAX_PULSE_US)
    }
}

/// LEDC duty for a pulse width at the servo frame rate.
pub fn duty_for_pulse(pulse_us: u16) -> u32 {
    let period_us = 1_000_000 / SERVO_PWM_FREQ_HZ;
    let full_scale = 1u32 << SERVO_PWM_RESOLUTION_BITS;
    u32::from(pulse_us) * full_scale / period_us
}

/// One servo on its own LEDC channel.
pub struct LedcServo {
    channel: u32,
    pin: Option<i32>,
    value: u16,
}

impl LedcServo {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            pin: None,
            value: 0,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.pin.is_some()
    }
}

impl ServoOutput for LedcServo {
    fn attach(&mut self, pin: i32) -> Result<()> {
        hw_init::configure_servo_channel(self.channel, pin)?;
        self.pin = Some(pin);
        Ok(())
    }

    fn write(&mut self, value: u16) {
        self.value = value;
        if self.pin.is_none() {
            return;
        }
        let pulse = pulse_width_us(value);
        let duty = duty_for_pulse(pulse);
        debug!("servo[{}]: {} -> {} us (duty {})", self.channel, value, pulse, duty);
        hw_init::ledc_set(self.channel, duty);
    }

    fn read(&self) -> u16 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_map_onto_the_pulse_range() {
        assert_eq!(pulse_width_us(0), 544);
        assert_eq!(pulse_width_us(90), 1472);
        assert_eq!(pulse_width_us(180), 2400);
        assert_eq!(pulse_width_us(300), 2400, "degrees clamp at 180");
    }

    #[test]
    fn microseconds_are_clamped() {
        assert_eq!(pulse_width_us(544), 544);
        assert_eq!(pulse_width_us(1500), 1500);
        assert_eq!(pulse_width_us(5000), 2400);
    }

    #[test]
    fn duty_at_50hz_14bit() {
        // 1500 / 20000 * 16384
        assert_eq!(duty_for_pulse(1500), 1228);
        assert_eq!(duty_for_pulse(20_000), 1 << 14);
    }

    #[test]
    fn remembers_last_value() {
        let mut s = LedcServo::new(0);
        s.write(45);
        assert!(!s.is_attached());
        s.attach(8).unwrap();
        s.write(1500);
        assert_eq!(s.read(), 1500);
    }
}
