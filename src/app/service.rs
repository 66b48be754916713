//! Bus service: the setup / loop harness.
//!
//! [`BusService`] owns the module registry and the command dispatcher.
//! The transport, clock and event sink are injected at each call, so the
//! whole loop runs against mock adapters in tests.
//!
//! ```text
//!  Transport ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │          BusService          │
//!  Clock ──────▶ │  dispatcher · module registry │
//!                └──────────────────────────────┘
//!                   │ setup / update / report / process_command
//!                   ▼
//!           digital_in · servo_out · pulse_in · servo_in
//! ```

use heapless::{String, Vec};
use log::{debug, info};

use super::events::BusEvent;
use super::ports::{Clock, EventSink};
use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::modules::{CommandResult, Module};
use crate::protocol::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::protocol::report::{Line, LineSink};
use crate::protocol::transport::{SerialSink, Transport};

/// Maximum number of registered modules.
pub const MAX_MODULES: usize = 8;

pub struct BusService<'m> {
    board_name: String<32>,
    modules: Vec<&'m mut dyn Module, MAX_MODULES>,
    dispatcher: CommandDispatcher,
    report_interval_ms: u32,
    last_report_ms: u32,
    tick_count: u64,
}

impl<'m> BusService<'m> {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            board_name: config.board_name.clone(),
            modules: Vec::new(),
            dispatcher: CommandDispatcher::fixed(config.command_timeout_ms),
            report_interval_ms: config.report_interval_ms,
            last_report_ms: 0,
            tick_count: 0,
        }
    }

    // ── Assembly ──────────────────────────────────────────────

    /// Add a module and route its opcodes to it.
    ///
    /// Fails on an opcode another module already claimed.  The bus is not
    /// usable after an error; the caller is expected to abort startup.
    pub fn register(&mut self, module: &'m mut dyn Module) -> Result<()> {
        let index = self.modules.len();
        if index >= MAX_MODULES {
            return Err(Error::TooManyModules);
        }
        for spec in module.commands() {
            self.dispatcher.register(index, *spec)?;
        }
        debug!(
            "bus: registered {} ({} opcodes)",
            module.name(),
            module.commands().len()
        );
        self.modules
            .push(module)
            .map_err(|_| Error::TooManyModules)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the board and set up every module in registration order.
    pub fn setup<T: Transport, C: Clock>(
        &mut self,
        transport: &mut T,
        clock: &C,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.banner(transport, "initializing");
        for module in &mut self.modules {
            module.setup()?;
        }
        self.banner(transport, "ready");

        self.last_report_ms = clock.now_ms();
        sink.emit(&BusEvent::Ready {
            modules: self.modules.len(),
        });
        info!("bus: {} ready with {} modules", self.board_name, self.modules.len());
        Ok(())
    }

    /// One loop iteration: at most one command, then every module's
    /// `update()`, then the periodic full report when it is due.
    pub fn tick<T: Transport, C: Clock>(
        &mut self,
        transport: &mut T,
        clock: &C,
        sink: &mut impl EventSink,
    ) -> DispatchOutcome {
        self.tick_count += 1;

        let outcome = self
            .dispatcher
            .poll(transport, clock, self.modules.as_mut_slice());
        self.emit_outcome(outcome, sink);

        let now_ms = clock.now_ms();
        let mut out = SerialSink::new(transport);
        for module in &mut self.modules {
            module.update(now_ms, &mut out);
        }

        if self.report_interval_ms > 0
            && now_ms.wrapping_sub(self.last_report_ms) >= self.report_interval_ms
        {
            self.report_all(transport, clock, sink);
        }

        outcome
    }

    /// Full report of every module, regardless of change.
    pub fn report_all<T: Transport, C: Clock>(
        &mut self,
        transport: &mut T,
        clock: &C,
        sink: &mut impl EventSink,
    ) {
        let now_ms = clock.now_ms();
        let mut out = SerialSink::new(transport);
        for module in &mut self.modules {
            module.report(now_ms, &mut out);
        }
        self.last_report_ms = now_ms;
        sink.emit(&BusEvent::Reported {
            modules: self.modules.len(),
        });
    }

    // ── Helpers ───────────────────────────────────────────────

    fn banner<T: Transport>(&self, transport: &mut T, phase: &str) {
        let line = Line::text("Board: ")
            .bytes(self.board_name.as_bytes())
            .raw(b' ')
            .bytes(phase.as_bytes());
        SerialSink::new(transport).send(&line);
    }

    fn emit_outcome(&self, outcome: DispatchOutcome, sink: &mut impl EventSink) {
        let event = match outcome {
            DispatchOutcome::Idle | DispatchOutcome::Separator => return,
            DispatchOutcome::Unknown(op) => BusEvent::UnknownOpcode(op),
            DispatchOutcome::TimedOut {
                opcode,
                received,
                expected,
            } => BusEvent::FrameTimedOut {
                opcode,
                received,
                expected,
            },
            DispatchOutcome::Dispatched {
                opcode,
                module,
                result,
            } => {
                let name = self.modules.get(module).map_or("?", |m| m.name());
                match result {
                    CommandResult::Applied => BusEvent::CommandApplied {
                        opcode,
                        module: name,
                    },
                    CommandResult::Rejected(reason) => BusEvent::CommandRejected {
                        opcode,
                        module: name,
                        reason,
                    },
                }
            }
        };
        sink.emit(&event);
    }
}
