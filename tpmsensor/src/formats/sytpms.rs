//! Support for the 6-byte SYTPMS sensor format.
//!
//! Layout: `TT PP PP BB SS CC`: temperature with a +40 offset, 16-bit
//! big-endian pressure in kPa, battery percentage, status byte, and an XOR
//! checksum of the first five bytes. Unlike the BR format the checksum here
//! is trusted, so a mismatch rejects the payload outright.

use crate::formats::{check_length, DecodeError};
use crate::reading::TpmsReading;
use crate::units::{bar_to_psi, battery_percent_to_volts, kpa_to_bar};
use bluez_async::uuid_from_u16;
use uuid::Uuid;

/// 16-bit service UUID advertised by SYTPMS sensors.
pub const UUID: Uuid = uuid_from_u16(0xfbb0);

pub const NAME: &str = "SYTPMS-6byte";
pub const MANUFACTURER: &str = "SYTPMS";

const LENGTH: usize = 6;
const TEMPERATURE_OFFSET: i16 = 40;

pub fn identify(name: Option<&str>, service_uuids: &[Uuid], data: &[u8]) -> bool {
    if let Some(name) = name {
        if name.to_uppercase().contains("TPMS") && data.len() == LENGTH {
            return true;
        }
    }
    service_uuids.contains(&UUID)
}

fn checksum(data: &[u8]) -> u8 {
    data[0..5].iter().fold(0, |acc, &b| acc ^ b)
}

pub fn decode(data: &[u8]) -> Result<TpmsReading, DecodeError> {
    check_length(data.len(), LENGTH)?;

    let calculated = checksum(data);
    if calculated != data[5] {
        return Err(DecodeError::ChecksumMismatch {
            calculated: calculated.into(),
            received: data[5].into(),
        });
    }

    let kpa = f64::from(u16::from_be_bytes([data[1], data[2]]));
    let pressure_bar = kpa_to_bar(kpa);
    let battery_percent = data[3];

    Ok(TpmsReading {
        status: data[4],
        battery_volts: battery_percent_to_volts(battery_percent),
        battery_percent: Some(battery_percent),
        temperature: i16::from(data[0]) - TEMPERATURE_OFFSET,
        pressure_bar,
        pressure_psi: bar_to_psi(pressure_bar),
        pressure_kpa: Some(kpa),
        position: None,
        hex_data: hex::encode(data),
        decoder: NAME,
        valid: true,
        warning: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // temp=65 (25°C), pressure=0x00dc (220 kPa), battery=85%, status=0,
    // checksum=0x41^0x00^0xdc^0x55^0x00=0xc8.
    const PACKET: [u8; 6] = [0x41, 0x00, 0xdc, 0x55, 0x00, 0xc8];

    #[test]
    fn identify_by_name_and_length() {
        assert!(identify(Some("TPMS"), &[], &PACKET));
        assert!(identify(Some("SY-TPMS"), &[], &PACKET));
        assert!(identify(Some("sy-tpms"), &[], &PACKET));
        // Right name, wrong length.
        assert!(!identify(Some("TPMS"), &[], &PACKET[..5]));
        // Right length, wrong name.
        assert!(!identify(Some("BR"), &[], &PACKET));
        assert!(!identify(None, &[], &PACKET));
    }

    #[test]
    fn identify_by_service_uuid() {
        assert!(identify(None, &[UUID], &[]));
        assert!(!identify(None, &[uuid_from_u16(0x27a5)], &[]));
    }

    #[test]
    fn decode_valid() {
        let reading = decode(&PACKET).unwrap();
        assert_eq!(reading.temperature, 25);
        assert_eq!(reading.pressure_kpa, Some(220.0));
        assert_eq!(reading.pressure_bar, 2.2);
        assert_eq!(reading.pressure_psi, 2.2 / crate::units::PSI_TO_BAR);
        assert_eq!(reading.battery_percent, Some(85));
        assert_eq!(reading.battery_volts, 2.55);
        assert_eq!(reading.status, 0);
        assert!(reading.valid);
        assert_eq!(reading.warning, None);
    }

    #[test]
    fn decode_bad_checksum_rejected() {
        // Flipping any single bit in bytes 0-4 must fail the XOR check.
        for byte in 0..5 {
            for bit in 0..8 {
                let mut data = PACKET;
                data[byte] ^= 1 << bit;
                assert_eq!(
                    decode(&data),
                    Err(DecodeError::ChecksumMismatch {
                        calculated: u16::from(checksum(&data)),
                        received: u16::from(data[5]),
                    })
                );
            }
        }
    }

    #[test]
    fn decode_too_short() {
        assert_eq!(
            decode(&PACKET[..5]),
            Err(DecodeError::WrongLength {
                length: 5,
                expected: 6
            })
        );
    }
}
