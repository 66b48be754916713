//! Mock hardware for integration tests.
//!
//! Every mock that a test needs to inspect while the bus holds it keeps
//! its state behind an `Rc`, so the test body keeps a handle.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use ardubus::app::events::BusEvent;
use ardubus::app::ports::{Clock, Debouncer, EdgeInterrupts, EventSink, ServoOutput};
use ardubus::app::service::BusService;
use ardubus::channel::{ChannelId, EdgeArena};
use ardubus::config::BoardConfig;
use ardubus::error::Result;
use ardubus::modules::digital_in::DigitalInModule;
use ardubus::modules::pulse_in::PulseInModule;
use ardubus::modules::servo_out::ServoOutModule;
use ardubus::protocol::transport::Transport;

// ── Transport ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_sends(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Drain written output as `\r\n`-separated lines.
    pub fn take_lines(&mut self) -> Vec<Vec<u8>> {
        let out = std::mem::take(&mut self.tx);
        let mut lines = Vec::new();
        let mut rest = out.as_slice();
        while let Some(pos) = rest.windows(2).position(|w| w == b"\r\n") {
            lines.push(rest[..pos].to_vec());
            rest = &rest[pos + 2..];
        }
        assert!(rest.is_empty(), "unterminated output: {:?}", rest);
        lines
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, ()> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, ()> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::result::Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Millisecond clock that advances `step` on every `now_ms()` read, so a
/// starved payload read always reaches its timeout.
pub struct MockClock {
    ms: Cell<u32>,
    step: u32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new(start_ms: u32, step: u32) -> Self {
        Self {
            ms: Cell::new(start_ms),
            step,
        }
    }

    pub fn set(&self, ms: u32) {
        self.ms.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.ms.set(self.ms.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u32 {
        self.ms.get().wrapping_mul(1000)
    }

    fn now_ms(&self) -> u32 {
        let t = self.ms.get();
        self.ms.set(t.wrapping_add(self.step));
        t
    }
}

// ── Debouncer ─────────────────────────────────────────────────

/// Applies a level queued through its handle on the next update.
pub struct MockDebouncer {
    state: bool,
    since_ms: u32,
    pending: Rc<Cell<Option<bool>>>,
}

impl MockDebouncer {
    pub fn new(state: bool) -> (Self, Rc<Cell<Option<bool>>>) {
        let pending = Rc::new(Cell::new(None));
        (
            Self {
                state,
                since_ms: 0,
                pending: pending.clone(),
            },
            pending,
        )
    }
}

impl Debouncer for MockDebouncer {
    fn update(&mut self, now_ms: u32) -> bool {
        match self.pending.take() {
            Some(level) if level != self.state => {
                self.state = level;
                self.since_ms = now_ms;
                true
            }
            _ => false,
        }
    }

    fn read(&self) -> bool {
        self.state
    }

    fn duration(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.since_ms)
    }
}

// ── Servo ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ServoState {
    pub pin: Option<i32>,
    pub writes: Vec<u16>,
}

pub struct MockServo(Rc<RefCell<ServoState>>);

impl MockServo {
    pub fn new() -> (Self, Rc<RefCell<ServoState>>) {
        let state = Rc::new(RefCell::new(ServoState::default()));
        (Self(state.clone()), state)
    }
}

impl ServoOutput for MockServo {
    fn attach(&mut self, pin: i32) -> Result<()> {
        self.0.borrow_mut().pin = Some(pin);
        Ok(())
    }

    fn write(&mut self, value: u16) {
        self.0.borrow_mut().writes.push(value);
    }

    fn read(&self) -> u16 {
        self.0.borrow().writes.last().copied().unwrap_or(0)
    }
}

// ── Edge interrupts ───────────────────────────────────────────

/// Tests fire edges straight into the arena.
pub struct NoIrq;

impl EdgeInterrupts for NoIrq {
    fn attach(&mut self, _pin: i32, _id: ChannelId) -> Result<()> {
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BusEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BusEvent) {
        self.events.push(*event);
    }
}

// ── Full board ────────────────────────────────────────────────

/// The four modules wired to mocks, plus handles into them.
pub struct Board<'a> {
    pub digital_in: DigitalInModule<MockDebouncer>,
    pub servo_out: ServoOutModule<MockServo>,
    pub pulse_in: PulseInModule<'a, NoIrq>,
    pub servo_in: PulseInModule<'a, NoIrq>,
    pub inputs: Vec<Rc<Cell<Option<bool>>>>,
    pub servos: Vec<Rc<RefCell<ServoState>>>,
}

#[allow(dead_code)]
impl<'a> Board<'a> {
    pub fn new(config: &BoardConfig, arena: &'a EdgeArena) -> Self {
        let offset = config.index_offset;

        let mut inputs = Vec::new();
        let mut debouncers = Vec::new();
        for _ in &config.digital_in.pins {
            let (d, handle) = MockDebouncer::new(true);
            debouncers.push(d);
            inputs.push(handle);
        }

        let mut servos = Vec::new();
        let mut outputs = Vec::new();
        for &pin in &config.servo_out.pins {
            let (s, handle) = MockServo::new();
            outputs.push((pin, s));
            servos.push(handle);
        }

        Self {
            digital_in: DigitalInModule::new(debouncers, offset, config.digital_in.update_interval_ms)
                .unwrap(),
            servo_out: ServoOutModule::new(outputs, offset, config.servo_out.initial_position)
                .unwrap(),
            pulse_in: PulseInModule::pulse_in(&config.pulse_in, offset, arena, NoIrq),
            servo_in: PulseInModule::servo_in(&config.servo_in, offset, arena, NoIrq),
            inputs,
            servos,
        }
    }

    /// Register all four modules in the firmware's order.
    pub fn bus(&mut self, config: &BoardConfig) -> BusService<'_> {
        let mut bus = BusService::new(config);
        bus.register(&mut self.digital_in).unwrap();
        bus.register(&mut self.servo_out).unwrap();
        bus.register(&mut self.pulse_in).unwrap();
        bus.register(&mut self.servo_in).unwrap();
        bus
    }
}

/// Default board with periodic reports off, so output is deterministic.
#[allow(dead_code)]
pub fn quiet_config() -> BoardConfig {
    BoardConfig {
        report_interval_ms: 0,
        ..BoardConfig::default()
    }
}
