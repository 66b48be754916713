//! UART transport for the host link.
//!
//! - **`target_os = "espidf"`**: ESP-IDF UART driver on `UART_NUM_1`,
//!   non-blocking reads from the driver's RX ring buffer.
//! - **`not(target_os = "espidf")`**: in-memory loopback for simulation:
//!   bytes pushed with [`UartTransport::inject`] are read back, writes are
//!   collected for [`UartTransport::take_output`].

use crate::protocol::transport::Transport;

#[cfg(target_os = "espidf")]
use super::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
const UART_PORT: i32 = 1;
#[cfg(target_os = "espidf")]
const RX_BUF_LEN: i32 = 256;

#[cfg(target_os = "espidf")]
pub struct UartTransport {
    port: i32,
}

#[cfg(target_os = "espidf")]
impl UartTransport {
    /// Install the UART driver on the host-link pins.
    pub fn new(baud_rate: u32) -> Result<Self, HwInitError> {
        use esp_idf_svc::sys::*;

        let cfg = uart_config_t {
            baud_rate: baud_rate as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };
        // SAFETY: called once from main() before the loop; the port is not
        // used by the console.
        unsafe {
            let ret = uart_driver_install(UART_PORT, RX_BUF_LEN * 2, 0, 0, core::ptr::null_mut(), 0);
            if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }
            let ret = uart_param_config(UART_PORT, &cfg);
            if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }
            let ret = uart_set_pin(
                UART_PORT,
                crate::pins::BUS_UART_TX_GPIO,
                crate::pins::BUS_UART_RX_GPIO,
                UART_PIN_NO_CHANGE,
                UART_PIN_NO_CHANGE,
            );
            if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }
        }
        log::info!("uart: host link on UART{} @ {} baud", UART_PORT, baud_rate);
        Ok(Self { port: UART_PORT })
    }
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = i32;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        // SAFETY: buf is valid for buf.len() bytes; zero ticks never blocks.
        let n = unsafe {
            esp_idf_svc::sys::uart_read_bytes(self.port, buf.as_mut_ptr().cast(), buf.len() as u32, 0)
        };
        if n < 0 { Err(n) } else { Ok(n as usize) }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        // SAFETY: data is valid for data.len() bytes.
        let n = unsafe {
            esp_idf_svc::sys::uart_write_bytes(self.port, data.as_ptr().cast(), data.len())
        };
        if n < 0 { Err(n) } else { Ok(n as usize) }
    }

    fn flush(&mut self) -> Result<(), i32> {
        // SAFETY: port installed in new().
        let ret = unsafe { esp_idf_svc::sys::uart_wait_tx_done(self.port, 10) };
        if ret != esp_idf_svc::sys::ESP_OK as i32 { Err(ret) } else { Ok(()) }
    }

    fn available(&self) -> bool {
        let mut len: usize = 0;
        // SAFETY: len is a valid out-pointer.
        unsafe { esp_idf_svc::sys::uart_get_buffered_data_len(self.port, &mut len) };
        len > 0
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct UartTransport {
    rx: std::collections::VecDeque<u8>,
    tx: std::vec::Vec<u8>,
}

#[cfg(not(target_os = "espidf"))]
impl UartTransport {
    pub fn new(baud_rate: u32) -> Result<Self, super::hw_init::HwInitError> {
        log::info!("uart(sim): loopback @ {} baud", baud_rate);
        Ok(Self::default())
    }

    /// Queue bytes as if the host had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Everything written since the last call.
    pub fn take_output(&mut self) -> std::vec::Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            let Some(b) = self.rx.pop_front() else { break };
            buf[n] = b;
            n += 1;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}
