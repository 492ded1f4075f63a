//! Loads the driver from a TOML config into a registry, binds a device and dumps
//! the registry snapshot.

use pegatron_laptop::backends::{VirtualAcpiDevice, VirtualInputBackend, VirtualWmiBus};
use pegatron_laptop::{DriverConfig, DriverRegistry, PegatronDriver, DRIVER_NAME};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
wmi_event_guid = "ABBC0F72-8EA1-11D1-00A0-C90629100000"

[[keymap]]
code = 0xf1
keycode = 238

[[keymap]]
code = 0xf3
keycode = 149

[[keymap]]
code = 0xf8
keycode = 0x212
"#;

fn main() -> pegatron_laptop::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DriverConfig::from_toml_str(CONFIG)?;
    let guid = config.wmi_event_guid.clone().unwrap_or_default();

    let wmi = VirtualWmiBus::new().with_guid(&guid);
    let input = VirtualInputBackend::new();

    let mut registry = DriverRegistry::new();
    registry.register_driver(PegatronDriver::new(config, wmi.clone(), input.clone()))?;

    registry.add_device(VirtualAcpiDevice::pegatron())?;
    if let Err(err) = registry.add_device(VirtualAcpiDevice::new("PNP0C0A", "PNP0C0A:00")) {
        println!("battery not bound: {err} (errno {})", err.errno());
    }

    wmi.fire_integer(&guid, 0xd0, 0xf1);
    registry.notify("PTK0001:00", 0xf3)?;

    for (uid, status) in registry.snapshot().iter() {
        println!("{uid} -> {:?}, wlan {:?}", status.state, status.wlan);
    }
    println!("reported: {:?}", input.key_events());

    registry.unregister_driver(DRIVER_NAME)?;
    Ok(())
}
