//! arDuBUS Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Drivers / adapters                        │
//! │                                                                │
//! │  UartTransport   SystemClock   LogEventSink                    │
//! │  PinDebouncer    LedcServo     GpioEdgeInterrupts → EDGE_ARENA │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  BusService: CommandDispatcher + module registry       │    │
//! │  │  digital_in · servo_out · pulse_in · servo_in          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_svc::hal::delay::FreeRtos;
use log::info;

use ardubus::adapters::log_sink::LogEventSink;
use ardubus::adapters::time::SystemClock;
use ardubus::app::ports::Clock;
use ardubus::app::service::BusService;
use ardubus::config::BoardConfig;
use ardubus::drivers::debounce::{GpioInput, PinDebouncer};
use ardubus::drivers::edge_isr::{EDGE_ARENA, GpioEdgeInterrupts};
use ardubus::drivers::hw_init;
use ardubus::drivers::servo::LedcServo;
use ardubus::drivers::uart::UartTransport;
use ardubus::modules::digital_in::DigitalInModule;
use ardubus::modules::pulse_in::PulseInModule;
use ardubus::modules::servo_out::ServoOutModule;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("arDuBUS v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Board config + peripherals ─────────────────────────
    let config = BoardConfig::load();
    hw_init::init_peripherals().map_err(|e| anyhow::anyhow!("{e}"))?;

    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut uart = UartTransport::new(config.baud_rate).map_err(|e| anyhow::anyhow!("{e}"))?;
    let offset = config.index_offset;

    // ── 3. Modules ────────────────────────────────────────────
    let now_ms = clock.now_ms();
    let mut debouncers = Vec::new();
    for &pin in &config.digital_in.pins {
        let input = GpioInput::new(pin, config.digital_in.pull_up)
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        debouncers.push(PinDebouncer::new(input, config.digital_in.debounce_ms, now_ms));
    }
    let mut digital_in =
        DigitalInModule::new(debouncers, offset, config.digital_in.update_interval_ms)?;

    let servos = config
        .servo_out
        .pins
        .iter()
        .enumerate()
        .map(|(channel, &pin)| (pin, LedcServo::new(channel as u32)));
    let mut servo_out = ServoOutModule::new(servos, offset, config.servo_out.initial_position)?;

    let mut pulse_in =
        PulseInModule::pulse_in(&config.pulse_in, offset, &EDGE_ARENA, GpioEdgeInterrupts::new());
    let mut servo_in =
        PulseInModule::servo_in(&config.servo_in, offset, &EDGE_ARENA, GpioEdgeInterrupts::new());

    // ── 4. Bus assembly (fails fast on opcode clashes) ───────
    let mut bus = BusService::new(&config);
    bus.register(&mut digital_in)?;
    bus.register(&mut servo_out)?;
    bus.register(&mut pulse_in)?;
    bus.register(&mut servo_in)?;
    bus.setup(&mut uart, &clock, &mut sink)
        .context("module setup failed")?;

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        bus.tick(&mut uart, &clock, &mut sink);
        FreeRtos::delay_ms(1);
    }
}
