//! Best-effort fallback for sensors whose format is not recognised.
//!
//! Scans the payload for a 16-bit big-endian value in the plausible absolute
//! tire-pressure range and guesses temperature and battery from the leading
//! bytes. Readings are always marked invalid so downstream consumers know
//! they are guesses rather than trusted decodes.

use crate::formats::{check_length, DecodeError};
use crate::reading::TpmsReading;
use crate::units::{battery_tenths_to_volts, psi_to_bar, ATMOSPHERIC_PSI};

pub const NAME: &str = "Generic";
pub const MANUFACTURER: &str = "Unknown";

const MIN_LENGTH: usize = 4;
const WARNING: &str = "generic decoder, values may be incorrect";

pub fn identify(data: &[u8]) -> bool {
    data.len() >= MIN_LENGTH
}

pub fn decode(data: &[u8]) -> Result<TpmsReading, DecodeError> {
    check_length(data.len(), MIN_LENGTH)?;

    // Look for an adjacent byte pair reading as 10-80 psi absolute in units
    // of 0.1 psi. First match wins.
    let mut pressure_psi = 0.0;
    for pair in data.windows(2) {
        let value = u16::from_be_bytes([pair[0], pair[1]]);
        if (101..800).contains(&value) {
            pressure_psi = f64::from(value) / 10.0 - ATMOSPHERIC_PSI;
            break;
        }
    }

    let temperature = if data[0] < 100 { data[0].into() } else { 0 };
    let battery_volts = if data[1] < 50 {
        battery_tenths_to_volts(data[1])
    } else {
        0.0
    };

    Ok(TpmsReading {
        status: data[0],
        battery_volts,
        battery_percent: None,
        temperature,
        pressure_bar: psi_to_bar(pressure_psi),
        pressure_psi,
        pressure_kpa: None,
        position: None,
        hex_data: hex::encode(data),
        decoder: NAME,
        valid: false,
        warning: Some(WARNING),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_needs_four_bytes() {
        assert!(identify(&[1, 2, 3, 4]));
        assert!(identify(&[0; 20]));
        assert!(!identify(&[1, 2, 3]));
        assert!(!identify(&[]));
    }

    #[test]
    fn decode_finds_plausible_pressure() {
        // 0x012c = 300 = 30.0 psi absolute, at offset 2.
        let reading = decode(&[0x19, 0x1c, 0x01, 0x2c]).unwrap();
        assert_eq!(reading.pressure_psi, 15.5);
        assert_eq!(reading.pressure_bar, psi_to_bar(15.5));
        assert_eq!(reading.temperature, 25);
        assert_eq!(reading.battery_volts, 2.8);
        assert!(!reading.valid);
        assert_eq!(reading.warning, Some(WARNING));
    }

    #[test]
    fn decode_first_match_wins() {
        // Both 0x012c (300) and 0x02bc (700) are in range; the first pair
        // must win.
        let reading = decode(&[0x01, 0x2c, 0x02, 0xbc]).unwrap();
        assert_eq!(reading.pressure_psi, 30.0 - ATMOSPHERIC_PSI);
    }

    #[test]
    fn decode_no_plausible_pressure() {
        let reading = decode(&[0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(reading.pressure_psi, 0.0);
        assert_eq!(reading.pressure_bar, 0.0);
        // 0xff is neither a plausible temperature nor battery.
        assert_eq!(reading.temperature, 0);
        assert_eq!(reading.battery_volts, 0.0);
    }

    #[test]
    fn decode_too_short() {
        assert_eq!(
            decode(&[1, 2, 3]),
            Err(DecodeError::WrongLength {
                length: 3,
                expected: 4
            })
        );
    }
}
