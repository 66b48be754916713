//! Peripheral drivers and hardware initialisation.
//!
//! | Driver      | Implements        | Peripheral                |
//! |-------------|-------------------|---------------------------|
//! | `debounce`  | Debouncer         | GPIO input                |
//! | `servo`     | ServoOutput       | LEDC PWM channel          |
//! | `edge_isr`  | EdgeInterrupts    | GPIO any-edge interrupt   |
//! | `uart`      | Transport         | UART1 host link           |

pub mod debounce;
pub mod edge_isr;
pub mod hw_init;
pub mod servo;
pub mod uart;
