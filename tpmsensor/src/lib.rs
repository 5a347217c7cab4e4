//! A library for decoding tire-pressure sensor (TPMS) readings from BLE
//! advertisements, and tracking per-sensor statistics over a monitoring
//! session.
//!
//! The decoder side is pure and synchronous: a [`DecoderRegistry`] picks the
//! right wire format from the advertised name, service UUIDs and payload
//! shape, and the chosen [`Decoder`] turns the manufacturer-data bytes into
//! a normalized [`TpmsReading`]. The [`SessionTracker`] builds per-device
//! statistics (dedup, transmission rate, change history with sleep-gap
//! classification) on top of the decoded readings. All I/O stays with the
//! caller.

pub mod formats;
pub mod reading;
pub mod registry;
pub mod session;
pub mod units;

pub use crate::formats::DecodeError;
pub use crate::reading::{SensorStatus, StatusFlags, TirePosition, TpmsReading};
pub use crate::registry::{Decoder, DecoderRegistry};
pub use crate::session::{
    classify_gap, DeviceSession, Gap, HistoryEntry, SessionConfig, SessionTracker,
};
