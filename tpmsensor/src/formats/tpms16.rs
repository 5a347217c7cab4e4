//! Support for the 16-byte MAC-prefixed sensor format used by "TPMS1" to
//! "TPMS4" branded sensors (the digit in the name encodes the wheel the
//! sensor is fitted to).
//!
//! Layout: bytes 0-5 echo the sensor's own MAC address, bytes 6-9 are a
//! 32-bit little-endian gauge pressure in Pa (0 = atmospheric, no offset to
//! subtract), bytes 10-11 a 16-bit little-endian temperature in 0.01 °C,
//! bytes 12-13 reserved, byte 14 the battery percentage and byte 15 alarm
//! flags. There is no checksum, so readings are always marked valid.

use crate::formats::{check_length, DecodeError};
use crate::reading::{TirePosition, TpmsReading};
use crate::units::{battery_percent_to_volts, pa_to_psi, psi_to_bar};

pub const NAME: &str = "TPMS-16byte";
pub const MANUFACTURER: &str = "Generic TPMS1-4";

const LENGTH: usize = 16;
const NAME_PREFIX: &str = "TPMS";

pub fn identify(name: Option<&str>, data: &[u8]) -> bool {
    has_position_name(name) || data.len() == LENGTH
}

fn has_position_name(name: Option<&str>) -> bool {
    name.and_then(|name| name.strip_prefix(NAME_PREFIX))
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Parses the tire position digit following the name prefix, e.g.
/// "TPMS3_82EACA334FE2" is the rear-left wheel.
pub fn position_from_name(name: Option<&str>) -> Option<TirePosition> {
    let rest = name?.strip_prefix(NAME_PREFIX)?;
    TirePosition::from_digit(rest.chars().next()?)
}

pub fn decode(data: &[u8], name: Option<&str>) -> Result<TpmsReading, DecodeError> {
    check_length(data.len(), LENGTH)?;

    let pa = f64::from(u32::from_le_bytes(data[6..10].try_into().unwrap()));
    let pressure_psi = pa_to_psi(pa);
    let temperature_centi = i16::from_le_bytes(data[10..12].try_into().unwrap());
    let battery_percent = data[14];

    Ok(TpmsReading {
        status: data[15],
        battery_volts: battery_percent_to_volts(battery_percent),
        battery_percent: Some(battery_percent),
        temperature: temperature_centi / 100,
        pressure_bar: psi_to_bar(pressure_psi),
        pressure_psi,
        pressure_kpa: Some(pa / 1000.0),
        position: position_from_name(name),
        hex_data: hex::encode(data),
        decoder: NAME,
        valid: true,
        warning: None,
    })
}
