//! Support for the 7-byte "BR" sensor format.
//!
//! Layout: `SS BB TT PP PP CC CC`: status bitmask, battery in 0.1 V,
//! signed temperature in °C, 16-bit big-endian absolute pressure in 0.1 psi,
//! and a 16-bit big-endian checksum (sum of the first five bytes).

use crate::formats::{check_length, DecodeError};
use crate::reading::TpmsReading;
use crate::units::{battery_tenths_to_volts, psi_to_bar, ATMOSPHERIC_PSI};
use bluez_async::uuid_from_u16;
use uuid::Uuid;

/// 16-bit service UUID advertised by BR sensors.
pub const UUID: Uuid = uuid_from_u16(0x27a5);

pub const NAME: &str = "BR-7byte";
pub const MANUFACTURER: &str = "Generic BR";

const LENGTH: usize = 7;

/// The simple-sum checksum has not been confirmed against live sensors, so a
/// mismatch flags the reading as untrusted rather than suppressing it.
const CHECKSUM_WARNING: &str = "checksum mismatch (algorithm unconfirmed)";

pub fn identify(name: Option<&str>, service_uuids: &[Uuid], data: &[u8]) -> bool {
    if name == Some("BR") || service_uuids.contains(&UUID) {
        return true;
    }
    // Weak heuristic: right length, and the battery byte reads as a
    // plausible voltage (under 5.0 V).
    data.len() == LENGTH && (1..50).contains(&data[1])
}

fn checksum(data: &[u8]) -> u16 {
    // Sum of bytes 0-4 modulo 65536. Five bytes cannot overflow a u16.
    data[0..5].iter().map(|&b| u16::from(b)).sum()
}

pub fn decode(data: &[u8]) -> Result<TpmsReading, DecodeError> {
    check_length(data.len(), LENGTH)?;

    let calculated = checksum(data);
    let received = u16::from_be_bytes([data[5], data[6]]);
    let valid = calculated == received;

    let absolute_psi = f64::from(u16::from_be_bytes([data[3], data[4]])) / 10.0;
    let pressure_psi = absolute_psi - ATMOSPHERIC_PSI;

    Ok(TpmsReading {
        status: data[0],
        battery_volts: battery_tenths_to_volts(data[1]),
        battery_percent: None,
        temperature: (data[2] as i8).into(),
        pressure_bar: psi_to_bar(pressure_psi),
        pressure_psi,
        pressure_kpa: None,
        position: None,
        hex_data: hex::encode(data),
        decoder: NAME,
        valid,
        warning: if valid { None } else { Some(CHECKSUM_WARNING) },
    })
}
