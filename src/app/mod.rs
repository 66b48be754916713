//! Application core: the bus harness, zero I/O.
//!
//! [`service::BusService`] runs the setup / loop lifecycle over the
//! registered modules.  All interaction with hardware happens through the
//! **port traits** in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod service;
