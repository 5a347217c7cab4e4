mod config;

use crate::config::{read_sensor_names, Config};
use bluez_async::{BluetoothEvent, BluetoothSession, DeviceEvent, DeviceId, MacAddress};
use eyre::eyre;
use futures::stream::StreamExt;
use log::debug;
use stable_eyre::eyre;
use std::collections::HashMap;
use std::time::Instant;
use tpmsensor::{DecoderRegistry, DeviceSession, SessionTracker};

#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    stable_eyre::install()?;
    pretty_env_logger::init();
    color_backtrace::install();

    let config = Config::from_file()?;
    let sensor_names = read_sensor_names(&config.monitor.sensor_names_filename)?;

    let registry = DecoderRegistry::new();
    let mut tracker = SessionTracker::new(config.monitor.session_config());

    println!("Available decoders:");
    for (name, manufacturer) in registry.decoders() {
        println!("  {name} ({manufacturer})");
    }
    if sensor_names.is_empty() {
        println!("No sensor allow-list configured; monitoring everything decodable.");
    } else {
        println!("Monitoring {} configured sensor(s).", sensor_names.len());
    }

    // Connect a Bluetooth session and scan for advertisements.
    let (_, session) = BluetoothSession::new().await?;
    session.start_discovery().await?;
    let mut events = session.event_stream().await?;

    while let Some(event) = events.next().await {
        if let BluetoothEvent::Device {
            id,
            event: DeviceEvent::ManufacturerData { manufacturer_data },
        } = event
        {
            handle_advertisement(
                &session,
                &id,
                manufacturer_data,
                &registry,
                &mut tracker,
                &sensor_names,
            )
            .await?;
        }
    }

    // The event stream should never end while the D-Bus connection is alive.
    Err(eyre!("BLE event stream ended unexpectedly"))
}

/// Decodes and records each company-id payload of one advertisement, and
/// prints a line for every accepted reading.
async fn handle_advertisement(
    session: &BluetoothSession,
    id: &DeviceId,
    manufacturer_data: HashMap<u16, Vec<u8>>,
    registry: &DecoderRegistry,
    tracker: &mut SessionTracker,
    sensor_names: &HashMap<MacAddress, String>,
) -> Result<(), eyre::Report> {
    let device = session.get_device_info(id).await?;

    // An empty allow-list means monitor everything decodable.
    if !sensor_names.is_empty() && !sensor_names.contains_key(&device.mac_address) {
        return Ok(());
    }
    let display_name = sensor_names
        .get(&device.mac_address)
        .cloned()
        .unwrap_or_else(|| device.mac_address.to_string());

    for (company_id, data) in manufacturer_data {
        let Some(reading) =
            registry.decode_advertisement(device.name.as_deref(), &device.services, &data)
        else {
            debug!(
                "No reading from {} company {:#06x}",
                device.mac_address, company_id
            );
            continue;
        };

        let now = Instant::now();
        if !tracker.record(device.mac_address.clone(), reading, now) {
            // Redundant re-delivery of the same broadcast.
            continue;
        }
        if let Some(state) = tracker.device(&device.mac_address) {
            print_reading(&display_name, state, now);
        }
    }
    Ok(())
}

fn print_reading(display_name: &str, state: &DeviceSession, now: Instant) {
    let mut line = format!("{display_name}: {}", state.last_reading());
    match state.rate(now) {
        Some(rate) => line.push_str(&format!(" {rate:.1}/min")),
        None => line.push_str(" -/min"),
    }
    line.push_str(&format!(" {} pkts", state.total_packets()));
    if let Some((_, Some(gap))) = state.annotated_history().last() {
        line.push_str(&format!(" (after {gap:?} gap)"));
    }
    println!("{line}");
}
