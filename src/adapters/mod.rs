//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to          |
//! |------------|------------|----------------------|
//! | `log_sink` | EventSink  | Console log output   |
//! | `time`     | Clock      | ESP32 system timer   |
//!
//! Peripheral-backed ports (debouncer, servo, edge interrupts, transport)
//! live in [`drivers`](crate::drivers).

pub mod log_sink;
pub mod time;
