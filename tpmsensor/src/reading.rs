//! The normalized reading produced by every decoder, and the status byte
//! shared by the formats which carry one.

use bitflags::bitflags;
use std::fmt::{self, Display, Formatter};

bitflags! {
    /// Status bitmask reported by BR-style sensors.
    pub struct StatusFlags: u8 {
        const ALARM = 0x80;
        const ROTATING = 0x40;
        const STILL = 0x20;
        const BACKGROUND_ROTATION = 0x10;
        const PRESSURE_FALLING_FAST = 0x08;
        const PRESSURE_RISING = 0x04;
        const PRESSURE_FALLING_SLOW = 0x02;
    }
}

/// Decoded sensor status. The raw value 0xff is a low-battery sentinel which
/// overrides all individual flag bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SensorStatus {
    LowBattery,
    Flags(StatusFlags),
}

impl From<u8> for SensorStatus {
    fn from(raw: u8) -> Self {
        if raw == 0xff {
            Self::LowBattery
        } else {
            Self::Flags(StatusFlags::from_bits_truncate(raw))
        }
    }
}

impl Display for SensorStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::LowBattery => f.write_str("LOW-BATTERY"),
            Self::Flags(flags) if flags.is_empty() => f.write_str("OK"),
            Self::Flags(flags) => {
                const LABELS: [(StatusFlags, &str); 7] = [
                    (StatusFlags::ALARM, "ALARM"),
                    (StatusFlags::ROTATING, "ROTATING"),
                    (StatusFlags::STILL, "STILL"),
                    (StatusFlags::BACKGROUND_ROTATION, "BACKGROUND-ROTATION"),
                    (StatusFlags::PRESSURE_FALLING_FAST, "PRESSURE-FALLING-FAST"),
                    (StatusFlags::PRESSURE_RISING, "PRESSURE-RISING"),
                    (StatusFlags::PRESSURE_FALLING_SLOW, "PRESSURE-FALLING-SLOW"),
                ];
                let mut first = true;
                for (flag, label) in LABELS {
                    if flags.contains(flag) {
                        if !first {
                            f.write_str(" ")?;
                        }
                        f.write_str(label)?;
                        first = false;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Tire position encoded in the device name of some sensors (e.g. "TPMS3_..."
/// is the rear-left wheel). Presentation metadata only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TirePosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl TirePosition {
    /// Short code for table displays.
    pub fn code(self) -> &'static str {
        match self {
            Self::FrontLeft => "FL",
            Self::FrontRight => "FR",
            Self::RearLeft => "RL",
            Self::RearRight => "RR",
        }
    }

    pub(crate) fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Self::FrontLeft),
            '2' => Some(Self::FrontRight),
            '3' => Some(Self::RearLeft),
            '4' => Some(Self::RearRight),
            _ => None,
        }
    }
}

impl Display for TirePosition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A normalized reading decoded from one manufacturer-data payload.
///
/// Produced fresh on every successful decode and never mutated afterwards.
/// `pressure_bar` is always derived from `pressure_psi` (or vice versa) under
/// the fixed conversion constant, never computed independently from the raw
/// bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct TpmsReading {
    /// Raw status byte, or 0 for formats without one.
    pub status: u8,
    /// Battery voltage. Approximated from the percentage for formats which
    /// only report one.
    pub battery_volts: f64,
    /// Battery percentage, for formats which report one.
    pub battery_percent: Option<u8>,
    /// Temperature in whole °C.
    pub temperature: i16,
    /// Gauge pressure in bar.
    pub pressure_bar: f64,
    /// Gauge pressure in psi.
    pub pressure_psi: f64,
    /// Gauge pressure in kPa, for formats whose wire unit is metric.
    pub pressure_kpa: Option<f64>,
    /// Tire position parsed from the device name, where the format encodes
    /// one.
    pub position: Option<TirePosition>,
    /// Hex representation of the source payload.
    pub hex_data: String,
    /// Name of the decoder which produced this reading.
    pub decoder: &'static str,
    /// False if the reading should not be trusted (failed checksum or
    /// heuristic extraction).
    pub valid: bool,
    /// Explanation of why `valid` is false, if it is.
    pub warning: Option<&'static str>,
}

impl TpmsReading {
    pub fn status_flags(&self) -> SensorStatus {
        self.status.into()
    }
}

impl Display for TpmsReading {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:.2} bar ({:.1} psi) {}ºC {:.1}V",
            self.pressure_bar, self.pressure_psi, self.temperature, self.battery_volts
        )?;
        if let Some(percent) = self.battery_percent {
            write!(f, " ({percent}%)")?;
        }
        write!(f, " {}", self.status_flags())?;
        if let Some(position) = self.position {
            write!(f, " {position}")?;
        }
        write!(f, " [{}]", self.decoder)?;
        if let Some(warning) = self.warning {
            write!(f, " ({warning})")?;
        }
        Ok(())
    }
}
