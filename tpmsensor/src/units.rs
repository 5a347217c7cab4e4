//! Pressure and battery unit conversions shared by all decoders.

/// Atmospheric pressure in psi, subtracted from absolute readings to get
/// gauge pressure.
pub const ATMOSPHERIC_PSI: f64 = 14.5;

/// 1 psi in bar.
pub const PSI_TO_BAR: f64 = 0.0689476;

/// 1 Pa in psi.
pub const PA_TO_PSI: f64 = 0.000145038;

/// 1 Pa in bar.
pub const PA_TO_BAR: f64 = 0.00001;

pub fn psi_to_bar(psi: f64) -> f64 {
    psi * PSI_TO_BAR
}

pub fn bar_to_psi(bar: f64) -> f64 {
    bar / PSI_TO_BAR
}

pub fn kpa_to_bar(kpa: f64) -> f64 {
    kpa / 100.0
}

pub fn pa_to_psi(pa: f64) -> f64 {
    pa * PA_TO_PSI
}

pub fn pa_to_bar(pa: f64) -> f64 {
    pa * PA_TO_BAR
}

/// Converts a raw battery byte in units of 0.1 V to volts.
pub fn battery_tenths_to_volts(raw: u8) -> f64 {
    f64::from(raw) / 10.0
}

/// Approximates a battery voltage from a 0-100 percentage, assuming a 3.0 V
/// cell. Used by formats which only report a percentage, so that all formats
/// can be displayed in the same voltage column.
pub fn battery_percent_to_volts(percent: u8) -> f64 {
    3.0 * f64::from(percent) / 100.0
}
