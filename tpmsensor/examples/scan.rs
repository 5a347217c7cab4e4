use bluez_async::{BluetoothEvent, BluetoothSession, DeviceEvent};
use futures::stream::StreamExt;
use tpmsensor::DecoderRegistry;

#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    pretty_env_logger::init();

    let registry = DecoderRegistry::new();
    let (_, session) = BluetoothSession::new().await?;
    let mut events = session.event_stream().await?;

    // Start scanning for Bluetooth devices.
    session.start_discovery().await?;

    // Wait for events.
    while let Some(event) = events.next().await {
        if let BluetoothEvent::Device {
            id,
            event: DeviceEvent::ManufacturerData { manufacturer_data },
        } = event
        {
            let device = session.get_device_info(&id).await?;
            for (company_id, data) in manufacturer_data {
                println!("{} ({:#06x}): {:?}", id, company_id, data);
                if let Some(reading) =
                    registry.decode_advertisement(device.name.as_deref(), &device.services, &data)
                {
                    println!("  {reading}");
                } else {
                    println!("  (Failed to decode.)");
                }
            }
        }
    }

    Ok(())
}
