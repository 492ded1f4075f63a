mod common;

use pegatron_laptop::backends::{VirtualAcpiDevice, VirtualInputBackend, VirtualWmiBus};
use pegatron_laptop::firmware::{AcpiObject, AcpiStatus};
use pegatron_laptop::{DriverConfig, EventFilter, InputKind, KeyCode, PegatronLaptop, WlanStatus};

use common::{init_tracing, RecordingListener, GUID};

fn subscribed() -> (PegatronLaptop, VirtualWmiBus, VirtualInputBackend) {
    init_tracing();
    let wmi = VirtualWmiBus::new().with_guid(GUID);
    let input = VirtualInputBackend::new();
    let laptop = PegatronLaptop::attach(
        Box::new(VirtualAcpiDevice::pegatron()),
        &wmi,
        &input,
        DriverConfig::default().with_wmi_guid(GUID),
    )
    .unwrap();
    assert!(laptop.is_subscribed());
    (laptop, wmi, input)
}

#[test]
fn each_hotkey_reaches_listeners_as_a_single_press() {
    let (_laptop, wmi, input) = subscribed();
    let rec = RecordingListener::default();
    input.add_listener(rec.clone(), EventFilter::KeysOnly, Some("pegatron-laptop/input0".into()));

    for code in [0xf1, 0xf3, 0xf8] {
        assert!(wmi.fire_integer(GUID, 0xd0, code));
    }

    assert_eq!(
        &*rec.events.lock().unwrap(),
        &[
            InputKind::KeyPressed { code: KeyCode::KEY_WLAN },
            InputKind::KeyPressed { code: KeyCode::KEY_PROG2 },
            InputKind::KeyPressed { code: KeyCode::KEY_TOUCHPAD_TOGGLE },
        ]
    );
    assert_eq!(wmi.outstanding_buffers(), 0);
}

#[test]
fn buffer_failure_leaves_state_untouched() {
    let (laptop, wmi, input) = subscribed();
    let before = laptop.status();

    wmi.fail_event_data(0xd0, AcpiStatus::AE_ERROR);
    assert!(wmi.fire(GUID, 0xd0));

    assert!(input.events().is_empty());
    assert_eq!(laptop.status(), before);
    assert_eq!(laptop.wlan_status(), WlanStatus::Off);
}

#[test]
fn wrong_type_buffer_is_released_and_ignored() {
    let (_laptop, wmi, input) = subscribed();

    wmi.set_event_object(0xd0, Some(AcpiObject::String("f1".into())));
    assert!(wmi.fire(GUID, 0xd0));
    wmi.set_event_object(0xd1, Some(AcpiObject::Package(vec![AcpiObject::Integer(0xf1)])));
    assert!(wmi.fire(GUID, 0xd1));

    assert!(input.events().is_empty());
    assert_eq!(wmi.buffers_acquired(), 2);
    assert_eq!(wmi.outstanding_buffers(), 0);
}

#[test]
fn unknown_code_is_not_reported() {
    let (_laptop, wmi, input) = subscribed();

    assert!(wmi.fire_integer(GUID, 0xd0, 0x42));

    assert!(input.events().is_empty());
}

#[test]
fn rapid_notifications_are_independent() {
    let (laptop, wmi, input) = subscribed();

    for _ in 0..100 {
        wmi.fire_integer(GUID, 0xd0, 0xf1);
        wmi.fire_integer(GUID, 0xd0, 0x00);
    }

    assert_eq!(input.key_events().len(), 100);
    assert_eq!(laptop.wlan_status(), WlanStatus::Off, "even number of toggles");
    assert_eq!(wmi.outstanding_buffers(), 0);
}

#[test]
fn detach_removes_handler_and_silences_events() {
    let (mut laptop, wmi, input) = subscribed();

    laptop.detach(&wmi);

    assert!(!wmi.has_handler(GUID));
    assert!(!wmi.fire_integer(GUID, 0xd0, 0xf1));
    assert!(input.events().is_empty());
}
