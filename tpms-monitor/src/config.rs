use bluez_async::{MacAddress, ParseMacAddressError};
use eyre::Report;
use serde::{Deserialize as _, Deserializer};
use serde_derive::Deserialize;
use std::collections::HashMap;
use std::fs::read_to_string;
use std::io::ErrorKind;
use std::time::Duration;
use tpmsensor::SessionConfig;

const DEFAULT_SENSOR_NAMES_FILENAME: &str = "sensor-names.toml";
const DEFAULT_DEDUP_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_HISTORY_CAPACITY: usize = 50;
const CONFIG_FILENAME: &str = "tpms-monitor.toml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub monitor: MonitorConfig,
}

impl Config {
    pub fn from_file() -> Result<Config, Report> {
        Config::read(CONFIG_FILENAME)
    }

    fn read(filename: &str) -> Result<Config, Report> {
        match read_to_string(filename) {
            Ok(config_file) => Ok(toml::from_str(&config_file)?),
            // A missing config file just means defaults.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(Report::new(e).wrap_err(format!("Reading {filename}"))),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub sensor_names_filename: String,
    /// The minimum time between accepted readings for the same sensor, to
    /// suppress redundant radio-layer re-delivery.
    #[serde(
        deserialize_with = "de_duration_seconds",
        rename = "dedup_interval_seconds"
    )]
    pub dedup_interval: Duration,
    /// How many distinct historical readings to keep per sensor.
    pub history_capacity: usize,
}

impl MonitorConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            dedup_interval: self.dedup_interval,
            history_capacity: self.history_capacity,
        }
    }
}

pub fn de_duration_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let seconds = u64::deserialize(d)?;
    Ok(Duration::from_secs(seconds))
}

impl Default for MonitorConfig {
    fn default() -> MonitorConfig {
        MonitorConfig {
            sensor_names_filename: DEFAULT_SENSOR_NAMES_FILENAME.to_owned(),
            dedup_interval: DEFAULT_DEDUP_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Reads the allow-list of sensors to monitor, keyed by MAC address. A
/// missing file means an empty allow-list, i.e. monitor everything decodable.
pub fn read_sensor_names(filename: &str) -> Result<HashMap<MacAddress, String>, Report> {
    let sensor_names_file = match read_to_string(filename) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(Report::new(e).wrap_err(format!("Reading {filename}"))),
    };
    let names = toml::from_str::<HashMap<String, String>>(&sensor_names_file)?
        .into_iter()
        .map(|(mac_address, name)| Ok::<_, ParseMacAddressError>((mac_address.parse()?, name)))
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(names)
}
