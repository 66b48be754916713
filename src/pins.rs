//! GPIO / peripheral pin assignments for the default arDuBUS board.
//!
//! These are the defaults baked into [`BoardConfig`](crate::config::BoardConfig);
//! a board file under `config/` can override every list.

// ---------------------------------------------------------------------------
// Digital inputs (debounced, pull-up enabled)
// ---------------------------------------------------------------------------

pub const DIGITAL_IN_PINS: [i32; 4] = [4, 5, 6, 7];

// ---------------------------------------------------------------------------
// Servo outputs (LEDC)
// ---------------------------------------------------------------------------

pub const SERVO_OUT_PINS: [i32; 4] = [8, 9, 10, 11];

// ---------------------------------------------------------------------------
// Edge-timed inputs
// ---------------------------------------------------------------------------

/// RC receiver channels (pulse-in module).
pub const PULSE_IN_PINS: [i32; 2] = [12, 13];
/// Servo feedback lines (servo-in module).
pub const SERVO_IN_PINS: [i32; 2] = [14, 15];

// ---------------------------------------------------------------------------
// Host link (UART1; UART0 stays on the console for logs)
// ---------------------------------------------------------------------------

pub const BUS_UART_TX_GPIO: i32 = 17;
pub const BUS_UART_RX_GPIO: i32 = 18;
pub const BUS_BAUD_RATE: u32 = 115_200;

// ---------------------------------------------------------------------------
// Servo PWM configuration
// ---------------------------------------------------------------------------

/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC timer resolution (bits).  14-bit at 50 Hz gives ~1.2 µs steps.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width for 0°.
pub const SERVO_MIN_PULSE_US: u16 = 544;
/// Pulse width for 180°.
pub const SERVO_MAX_PULSE_US: u16 = 2400;
