//! The wire formats spoken by known TPMS sensors.
//!
//! Each submodule implements the shared decoder contract: a cheap, pure
//! `identify` over the advertisement evidence (device name, advertised
//! service UUIDs, payload bytes), and a pure `decode` of the payload into a
//! [`TpmsReading`](crate::reading::TpmsReading).

pub mod br;
pub mod generic;
pub mod sytpms;
pub mod tpms16;

use thiserror::Error;

/// An error decoding a manufacturer-data payload.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error("Wrong payload length {length}, expected {expected}")]
    WrongLength { length: usize, expected: usize },
    #[error("Checksum mismatch: calculated {calculated:#06x}, received {received:#06x}")]
    ChecksumMismatch { calculated: u16, received: u16 },
}

fn check_length(length: usize, expected: usize) -> Result<(), DecodeError> {
    if length < expected {
        Err(DecodeError::WrongLength { length, expected })
    } else {
        Ok(())
    }
}
