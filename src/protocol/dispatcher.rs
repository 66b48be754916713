//! Command dispatcher: the single consumer of the inbound byte stream.
//!
//! ```text
//!            ┌──────────────────┐ registered  ┌─────────────────────────┐
//!  byte ───▶ │  AwaitingOpcode  │────────────▶│ AwaitingPayload(n)      │
//!            └──────────────────┘             │ (bounded by timeout)    │
//!               ▲   │ unknown / CR / LF       └───────────┬─────────────┘
//!               │   ▼ discarded                           │ n bytes in
//!               │                                         ▼
//!               │                             ┌─────────────────────────┐
//!               └─────────────────────────────│ Dispatching             │
//!                                             │ module.process_command  │
//!                                             └─────────────────────────┘
//! ```
//!
//! Once an opcode is accepted the payload is read in a blocking loop, but
//! only until `timeout_ms` elapses.  A host that stops mid-frame costs the
//! main loop at most one timeout; the partial frame is then discarded.

use heapless::Vec;
use log::{debug, trace, warn};

use super::codec::{Decoded, DecoderState, FixedFrameDecoder, Frame, FrameDecoder, MAX_OPCODES};
use super::transport::{SerialSink, Transport};
use crate::app::ports::Clock;
use crate::error::{Error, Result};
use crate::modules::{CommandResult, CommandSpec, Module};

/// Observable dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    AwaitingOpcode,
    AwaitingPayload { expected: usize },
    Dispatching,
}

/// What one call to [`CommandDispatcher::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No byte was waiting.
    Idle,
    /// A CR/LF between frames was skipped.
    Separator,
    /// An unregistered opcode byte was discarded.
    Unknown(u8),
    /// The payload did not arrive in time and was discarded.
    TimedOut {
        opcode: u8,
        received: usize,
        expected: usize,
    },
    /// A frame was handed to `module` (index in registration order).
    Dispatched {
        opcode: u8,
        module: usize,
        result: CommandResult,
    },
}

#[derive(Debug, Clone, Copy)]
struct Route {
    opcode: u8,
    module: usize,
}

/// Routes complete frames to the module that registered their opcode.
pub struct CommandDispatcher<D: FrameDecoder = FixedFrameDecoder> {
    decoder: D,
    routes: Vec<Route, MAX_OPCODES>,
    timeout_ms: u32,
    dispatching: bool,
}

impl CommandDispatcher<FixedFrameDecoder> {
    /// Dispatcher over the standard fixed-length framing.
    pub fn fixed(timeout_ms: u32) -> Self {
        Self::new(FixedFrameDecoder::new(), timeout_ms)
    }
}

impl<D: FrameDecoder> CommandDispatcher<D> {
    pub fn new(decoder: D, timeout_ms: u32) -> Self {
        Self {
            decoder,
            routes: Vec::new(),
            timeout_ms,
            dispatching: false,
        }
    }

    /// Route `spec.opcode` to the module at `module`.
    ///
    /// Duplicate opcodes are a configuration error; the bus refuses to
    /// start rather than guessing which module was meant.
    pub fn register(&mut self, module: usize, spec: CommandSpec) -> Result<()> {
        if self.route(spec.opcode).is_some() {
            return Err(Error::DuplicateOpcode(spec.opcode));
        }
        self.decoder.declare(spec.opcode, spec.payload_len)?;
        self.routes
            .push(Route {
                opcode: spec.opcode,
                module,
            })
            .map_err(|_| Error::TooManyRoutes)
    }

    /// Module index registered for `opcode`.
    pub fn route(&self, opcode: u8) -> Option<usize> {
        self.routes
            .iter()
            .find(|r| r.opcode == opcode)
            .map(|r| r.module)
    }

    pub fn state(&self) -> DispatcherState {
        if self.dispatching {
            return DispatcherState::Dispatching;
        }
        match self.decoder.state() {
            DecoderState::AwaitingOpcode => DispatcherState::AwaitingOpcode,
            DecoderState::AwaitingPayload { expected, .. } => {
                DispatcherState::AwaitingPayload { expected }
            }
        }
    }

    /// Read and handle at most one frame.
    ///
    /// Returns immediately when no byte is waiting.  After an accepted
    /// opcode, blocks until its payload is complete or the timeout expires.
    pub fn poll<'m, T: Transport, C: Clock>(
        &mut self,
        transport: &mut T,
        clock: &C,
        modules: &mut [&'m mut dyn Module],
    ) -> DispatchOutcome {
        let Some(byte) = transport.read_byte() else {
            return DispatchOutcome::Idle;
        };

        match self.decoder.push(byte) {
            Decoded::Pending => {}
            other => return self.finish(other, transport, modules),
        }

        let started_ms = clock.now_ms();
        loop {
            if let Some(byte) = transport.read_byte() {
                match self.decoder.push(byte) {
                    Decoded::Pending => continue,
                    other => return self.finish(other, transport, modules),
                }
            }

            if clock.now_ms().wrapping_sub(started_ms) >= self.timeout_ms {
                return self.abandon();
            }
            core::hint::spin_loop();
        }
    }

    fn finish<'m, T: Transport>(
        &mut self,
        decoded: Decoded,
        transport: &mut T,
        modules: &mut [&'m mut dyn Module],
    ) -> DispatchOutcome {
        match decoded {
            Decoded::Pending => DispatchOutcome::Idle,
            Decoded::Separator => DispatchOutcome::Separator,
            Decoded::Unknown(op) => {
                debug!("dispatch: discarded unknown opcode 0x{:02X}", op);
                DispatchOutcome::Unknown(op)
            }
            Decoded::Frame(frame) => self.dispatch(&frame, transport, modules),
        }
    }

    fn dispatch<'m, T: Transport>(
        &mut self,
        frame: &Frame,
        transport: &mut T,
        modules: &mut [&'m mut dyn Module],
    ) -> DispatchOutcome {
        let opcode = frame.opcode();
        let Some(index) = self.route(opcode).filter(|&i| i < modules.len()) else {
            // Only reachable with a decoder that knows opcodes we don't route.
            return DispatchOutcome::Unknown(opcode);
        };

        trace!(
            "dispatch: {:?} +{}B -> {}",
            opcode as char,
            frame.payload().len(),
            modules[index].name()
        );

        self.dispatching = true;
        let mut sink = SerialSink::new(transport);
        let result = modules[index].process_command(frame, &mut sink);
        self.dispatching = false;

        DispatchOutcome::Dispatched {
            opcode,
            module: index,
            result,
        }
    }

    fn abandon(&mut self) -> DispatchOutcome {
        let outcome = match self.decoder.state() {
            DecoderState::AwaitingPayload {
                opcode,
                expected,
                collected,
            } => DispatchOutcome::TimedOut {
                opcode,
                received: collected,
                expected,
            },
            DecoderState::AwaitingOpcode => DispatchOutcome::Idle,
        };
        warn!("dispatch: partial frame dropped after {} ms: {:?}", self.timeout_ms, outcome);
        self.decoder.reset();
        outcome
    }
}
