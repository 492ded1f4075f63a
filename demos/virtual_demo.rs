//! Attaches a Pegatron laptop to virtual firmware and presses its hotkeys.
//!
//! Run with `RUST_LOG=pegatron=debug` to see the attach sequence.

use pegatron_laptop::backends::{VirtualAcpiDevice, VirtualInputBackend, VirtualWmiBus};
use pegatron_laptop::logger::Logger;
use pegatron_laptop::{DriverConfig, EventFilter, HotkeyEvent, InputListener, KeyCode, PegatronLaptop};
use tracing_subscriber::EnvFilter;

const GUID: &str = "ABBC0F72-8EA1-11D1-00A0-C90629100000";

/// Prints every WLAN hotkey press.
struct WlanWatcher;

impl InputListener for WlanWatcher {
    fn on_input(&mut self, event: &HotkeyEvent) {
        println!("(WLAN) {:?} on {}", event.kind, event.device);
    }
}

fn main() -> pegatron_laptop::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let wmi = VirtualWmiBus::new().with_guid(GUID);
    let input = VirtualInputBackend::new();
    input.add_listener(Logger, EventFilter::KeysOnly, None);
    input.add_listener(
        WlanWatcher,
        EventFilter::Custom(|ev| ev.kind.keycode() == Some(KeyCode::KEY_WLAN)),
        Some("pegatron-laptop/input0".into()),
    );

    let mut laptop = PegatronLaptop::attach(
        Box::new(VirtualAcpiDevice::pegatron()),
        &wmi,
        &input,
        DriverConfig::default().with_wmi_guid(GUID),
    )?;

    // Hotkeys delivered through the WMI channel.
    for code in [0xf1, 0xf3, 0xf8, 0x42] {
        wmi.fire_integer(GUID, 0xd0, code);
    }
    // And one through a plain ACPI notify.
    let translation = laptop.notify(0xf1);
    println!("notify 0xf1 -> {translation:?}");

    println!("{}", laptop.status().to_json()?);
    laptop.detach(&wmi);
    Ok(())
}
