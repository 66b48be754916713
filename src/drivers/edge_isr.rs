//! GPIO edge interrupts feeding the edge arena.
//!
//! One shared handler serves every edge-timed pin.  The ISR argument packs
//! the pin number and the arena slot, so the handler reads the level, takes
//! a timestamp and updates one slot without any lookup:
//!
//! ```text
//!   arg = pin << 8 | channel id
//! ```
//!
//! Handlers are added once at setup and never removed.
//!
//! ## Edge direction
//!
//! Pins use `GPIO_INTR_ANYEDGE` and the handler classifies the edge by the
//! level it reads on entry.  If the pin has already changed again by then
//! (a pulse shorter than interrupt latency, or a handler delayed by a
//! higher-priority interrupt), a rising edge is recorded as falling or the
//! other way round.  The resulting pair mixes two pulses and usually has an
//! implausible width; set `max_width_us` for the channel (about 2500 us for
//! RC and servo signals) so [`PulseChannel`](crate::channel::PulseChannel)
//! holds the previous reading instead of reporting it.

use log::info;

use super::hw_init;
use crate::app::ports::EdgeInterrupts;
use crate::channel::{ChannelId, EdgeArena};
use crate::error::Result;

/// Edge slots for every pulse-in and servo-in pin.
pub static EDGE_ARENA: EdgeArena = EdgeArena::new();

/// Pack an ISR argument.
pub fn pack_isr_arg(pin: i32, id: ChannelId) -> usize {
    ((pin as usize) << 8) | id.index()
}

/// Inverse of [`pack_isr_arg`].
pub fn unpack_isr_arg(arg: usize) -> (i32, ChannelId) {
    ((arg >> 8) as i32, ChannelId::from_raw(arg & 0xFF))
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_gpio_isr(arg: *mut core::ffi::c_void) {
    let (pin, id) = unpack_isr_arg(arg as usize);
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    let now_us = unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u32;
    let high = hw_init::gpio_read(pin);
    EDGE_ARENA.on_edge(id, high, now_us);
}

/// Attaches [`EDGE_ARENA`] slots to GPIO interrupts.
#[derive(Debug, Default)]
pub struct GpioEdgeInterrupts;

impl GpioEdgeInterrupts {
    pub fn new() -> Self {
        Self
    }
}

impl EdgeInterrupts for GpioEdgeInterrupts {
    #[cfg(target_os = "espidf")]
    fn attach(&mut self, pin: i32, id: ChannelId) -> Result<()> {
        use esp_idf_svc::sys::{ESP_OK, gpio_intr_enable, gpio_isr_handler_add};

        hw_init::configure_edge_input(pin)?;
        let arg = pack_isr_arg(pin, id) as *mut core::ffi::c_void;
        // SAFETY: the ISR service is installed by init_peripherals(); the
        // handler only does lock-free atomic stores into EDGE_ARENA.
        let ret = unsafe { gpio_isr_handler_add(pin, Some(edge_gpio_isr), arg) };
        if ret != ESP_OK as i32 {
            return Err(hw_init::HwInitError::IsrAttachFailed(ret).into());
        }
        // SAFETY: pin configured above.
        unsafe { gpio_intr_enable(pin) };
        info!("edge_isr: pin {} -> slot {}", pin, id.index());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn attach(&mut self, pin: i32, id: ChannelId) -> Result<()> {
        hw_init::configure_edge_input(pin)?;
        info!("edge_isr(sim): pin {} -> slot {} (no interrupts)", pin, id.index());
        Ok(())
    }
}
