//! Dispatcher behaviour against real modules: routing, registration
//! conflicts and payloads that trickle in.

use crate::mock_hw::{quiet_config, Board, MockClock, MockServo, RecordingSink};

use ardubus::app::service::BusService;
use ardubus::channel::EdgeArena;
use ardubus::error::Error;
use ardubus::modules::servo_out::ServoOutModule;
use ardubus::modules::{CommandResult, Module};
use ardubus::protocol::dispatcher::{CommandDispatcher, DispatchOutcome};
use ardubus::protocol::transport::Transport;

/// Releases one byte only every `gap + 1` read attempts.
struct DripTransport {
    bytes: Vec<u8>,
    gap: usize,
    attempts: usize,
    tx: Vec<u8>,
}

impl DripTransport {
    fn new(bytes: &[u8], gap: usize) -> Self {
        Self {
            bytes: bytes.to_vec(),
            gap,
            attempts: 0,
            tx: Vec::new(),
        }
    }
}

impl Transport for DripTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        self.attempts += 1;
        if self.bytes.is_empty() || buf.is_empty() || self.attempts % (self.gap + 1) != 0 {
            return Ok(0);
        }
        buf[0] = self.bytes.remove(0);
        Ok(1)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.bytes.is_empty()
    }
}

#[test]
fn slow_payload_within_timeout_is_dispatched() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let clock = MockClock::new(0, 1);
    let mut sink = RecordingSink::default();
    let mut t = DripTransport::new(b"", 0);
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();

    // 10 empty reads between bytes, 1 ms per clock read: well under 100 ms
    let mut t = DripTransport::new(b"s 0384", 10);
    let mut outcome = DispatchOutcome::Idle;
    while outcome == DispatchOutcome::Idle {
        outcome = bus.tick(&mut t, &clock, &mut sink);
    }

    assert!(matches!(
        outcome,
        DispatchOutcome::Dispatched { opcode: b's', result: CommandResult::Applied, .. }
    ));
    assert_eq!(servos[0].borrow().writes.last(), Some(&900));
    assert_eq!(t.tx, b"s 0384\x06\r\n");
}

#[test]
fn two_modules_claiming_one_opcode_fail_fast() {
    let (a, _) = MockServo::new();
    let (b, _) = MockServo::new();
    let mut first = ServoOutModule::new([(1, a)], 32, 90).unwrap();
    let mut second = ServoOutModule::new([(2, b)], 32, 90).unwrap();

    let mut bus = BusService::new(&quiet_config());
    bus.register(&mut first).unwrap();
    assert_eq!(bus.register(&mut second), Err(Error::DuplicateOpcode(b'S')));
}

#[test]
fn every_registered_opcode_routes_to_its_owner() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let board = Board::new(&config, &arena);

    let mut dispatcher = CommandDispatcher::fixed(config.command_timeout_ms);
    let modules: [&dyn Module; 4] = [
        &board.digital_in,
        &board.servo_out,
        &board.pulse_in,
        &board.servo_in,
    ];
    for (i, m) in modules.iter().enumerate() {
        for spec in m.commands() {
            dispatcher.register(i, *spec).unwrap();
        }
    }

    assert_eq!(dispatcher.route(b'S'), Some(1));
    assert_eq!(dispatcher.route(b's'), Some(1));
    assert_eq!(dispatcher.route(b'D'), None, "report letters are not opcodes");
    assert_eq!(dispatcher.route(b'V'), None);
}
