//! End-to-end bus scenarios: bytes in from the host, lines out.

use crate::mock_hw::{quiet_config, Board, MockClock, MockTransport, RecordingSink};

use ardubus::app::events::BusEvent;
use ardubus::channel::{ChannelId, EdgeArena};
use ardubus::config::BoardConfig;
use ardubus::modules::{CommandResult, Rejection};
use ardubus::protocol::dispatcher::{DispatchOutcome, DispatcherState};

/// Host link, a clock ticking 1 ms per read, and an event recorder.
fn harness() -> (MockTransport, MockClock, RecordingSink) {
    (MockTransport::new(), MockClock::new(0, 1), RecordingSink::default())
}

#[test]
fn boot_banner_wraps_module_setup() {
    let arena = EdgeArena::new();
    let mut config = quiet_config();
    config.board_name.clear();
    config.board_name.push_str("bench").unwrap();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);

    bus.setup(&mut t, &clock, &mut sink).unwrap();

    assert_eq!(
        t.take_lines(),
        vec![b"Board: bench initializing".to_vec(), b"Board: bench ready".to_vec()]
    );
    assert_eq!(sink.events, vec![BusEvent::Ready { modules: 4 }]);
    for (servo, pin) in servos.iter().zip(config.servo_out.pins.iter()) {
        assert_eq!(servo.borrow().pin, Some(*pin));
        assert_eq!(servo.borrow().writes, vec![90]);
    }
    assert_eq!(arena.len(), 4, "pulse-in and servo-in pins bound");
}

// ── Scenario 1: default width before any edge ────────────────

#[test]
fn report_shows_initial_width_before_first_pulse() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    bus.report_all(&mut t, &clock, &mut sink);

    let lines = t.take_lines();
    assert!(lines.contains(&b"RS 05DC".to_vec()));
    assert!(lines.contains(&b"RS!05DC".to_vec()));
    assert!(lines.contains(&b"RV 05DC".to_vec()));
    assert!(lines.iter().any(|l| l.starts_with(b"RD 1")));
}

// ── Scenario 2: one pulse, one change report ─────────────────

#[test]
fn measured_pulse_is_reported_once_then_held() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    // first pulse-in pin is arena slot 0
    let ch0 = ChannelId::from_raw(0);
    arena.on_rising(ch0, 1000);
    arena.on_falling(ch0, 1520);

    bus.tick(&mut t, &clock, &mut sink);
    assert_eq!(t.take_lines(), vec![b"CS 0208".to_vec()]);

    bus.tick(&mut t, &clock, &mut sink);
    assert!(t.take_lines().is_empty(), "no new edge pair, no report");

    bus.report_all(&mut t, &clock, &mut sink);
    let lines = t.take_lines();
    assert!(lines.contains(&b"RS 0208".to_vec()));
    assert!(lines.contains(&b"RS!05DC".to_vec()));
}

#[test]
fn servo_in_reports_under_its_own_letter() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    // servo-in binds after the two pulse-in pins
    let ch = ChannelId::from_raw(3);
    arena.on_rising(ch, 50_000);
    arena.on_falling(ch, 52_000);
    bus.tick(&mut t, &clock, &mut sink);

    assert_eq!(t.take_lines(), vec![b"CV!07D0".to_vec()]);
}

// ── Scenario 3: raw servo write ──────────────────────────────

#[test]
fn raw_servo_write_moves_servo_and_echoes() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    t.host_sends(&[b'S', config.index_offset, 45, b'\n']);
    let outcome = bus.tick(&mut t, &clock, &mut sink);

    assert_eq!(
        outcome,
        DispatchOutcome::Dispatched {
            opcode: b'S',
            module: 1,
            result: CommandResult::Applied
        }
    );
    assert_eq!(servos[0].borrow().writes.last(), Some(&45));
    assert_eq!(t.take_lines(), vec![vec![b'S', config.index_offset, 45, 0x06]]);

    // trailing newline is a separator, not an unknown opcode
    assert_eq!(bus.tick(&mut t, &clock, &mut sink), DispatchOutcome::Separator);
    assert!(!sink.events.iter().any(|e| matches!(e, BusEvent::UnknownOpcode(_))));
}

#[test]
fn hex_servo_write_sets_microseconds() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    t.host_sends(b"s#09C4");
    bus.tick(&mut t, &clock, &mut sink);

    assert_eq!(servos[3].borrow().writes.last(), Some(&2500));
    assert_eq!(t.take_lines(), vec![b"s#09C4\x06".to_vec()]);
}

// ── Scenario 4: unknown opcode ───────────────────────────────

#[test]
fn unknown_opcode_is_discarded_silently() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();
    sink.events.clear();

    t.host_sends(b"X");
    assert_eq!(bus.tick(&mut t, &clock, &mut sink), DispatchOutcome::Unknown(b'X'));

    assert_eq!(bus.dispatcher().state(), DispatcherState::AwaitingOpcode);
    assert!(t.take_lines().is_empty());
    assert_eq!(sink.events, vec![BusEvent::UnknownOpcode(b'X')]);
    for servo in &servos {
        assert_eq!(servo.borrow().writes, vec![90]);
    }
}

// ── Boundary: out-of-range index ─────────────────────────────

#[test]
fn index_past_last_channel_is_rejected_without_output() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();
    sink.events.clear();

    let first_invalid = config.index_offset + config.servo_out.pins.len() as u8;
    for index in [first_invalid, 0xFF, 0x00] {
        t.host_sends(&[b'S', index, 10]);
        let outcome = bus.tick(&mut t, &clock, &mut sink);
        assert_eq!(
            outcome,
            DispatchOutcome::Dispatched {
                opcode: b'S',
                module: 1,
                result: CommandResult::Rejected(Rejection::IndexOutOfRange(index))
            }
        );
    }

    assert!(t.take_lines().is_empty());
    assert_eq!(sink.events.len(), 3);
    assert!(servos.iter().all(|s| s.borrow().writes == vec![90]));
}

// ── Starved payload ──────────────────────────────────────────

#[test]
fn starved_frame_times_out_and_bus_recovers() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let servos = board.servos.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();
    sink.events.clear();

    t.host_sends(b"s 0");
    let outcome = bus.tick(&mut t, &clock, &mut sink);
    assert_eq!(
        outcome,
        DispatchOutcome::TimedOut {
            opcode: b's',
            received: 2,
            expected: 5
        }
    );
    assert_eq!(
        sink.events,
        vec![BusEvent::FrameTimedOut { opcode: b's', received: 2, expected: 5 }]
    );
    assert!(t.take_lines().is_empty());

    t.host_sends(b"S!\x10");
    bus.tick(&mut t, &clock, &mut sink);
    assert_eq!(servos[1].borrow().writes.last(), Some(&0x10));
}

// ── Digital inputs through the bus ───────────────────────────

#[test]
fn digital_change_is_reported_through_the_bus() {
    let arena = EdgeArena::new();
    let config = quiet_config();
    let mut board = Board::new(&config, &arena);
    let inputs = board.inputs.clone();
    let (mut t, clock, mut sink) = harness();
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    inputs[2].set(Some(false));
    bus.tick(&mut t, &clock, &mut sink);

    assert_eq!(t.take_lines(), vec![b"CD\"0".to_vec()]);
}

// ── Periodic full report ─────────────────────────────────────

#[test]
fn full_report_is_emitted_every_interval() {
    let arena = EdgeArena::new();
    let config = BoardConfig {
        report_interval_ms: 1000,
        ..BoardConfig::default()
    };
    let mut board = Board::new(&config, &arena);
    let (mut t, _, mut sink) = harness();
    let clock = MockClock::new(0, 0);
    let mut bus = board.bus(&config);
    bus.setup(&mut t, &clock, &mut sink).unwrap();
    t.take_lines();

    clock.set(999);
    bus.tick(&mut t, &clock, &mut sink);
    assert!(t.take_lines().is_empty());

    clock.set(1000);
    bus.tick(&mut t, &clock, &mut sink);
    let lines = t.take_lines();
    // 4 digital + 2 pulse-in + 2 servo-in; servo-out does not report
    assert_eq!(lines.len(), 8);
    assert!(lines.iter().all(|l| l[0] == b'R'));
    assert!(sink.events.contains(&BusEvent::Reported { modules: 4 }));

    clock.set(1500);
    bus.tick(&mut t, &clock, &mut sink);
    assert!(t.take_lines().is_empty());
}
