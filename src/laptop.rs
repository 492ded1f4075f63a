//! Per-device driver state and the attach/detach sequence.
//!
//! Attach runs four steps, in order:
//!
//! 1. check that the firmware implements the init method (`INIT`);
//! 2. call it once with the magic argument (`0x55AA66BB`);
//! 3. allocate and register the input device with the sparse keymap;
//! 4. subscribe to the WMI event GUID, if one is configured.
//!
//! Steps 1–3 are fatal: the first failure aborts attach and anything acquired so far
//! is released. Step 4 is best-effort; a failed subscription is logged and the device
//! stays usable through plain ACPI notifications.
//!
//! Detach undoes the steps in reverse and is safe to call more than once.

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::firmware::{AcpiDevice, WmiBus};
use crate::input::{InputBackend, InputHandle};
use crate::snapshot::{AttachState, DriverStatus, WlanStatus};
use crate::translator::{Translation, Translator};
use crate::wmi::WmiSubscription;

/// State of one bound Pegatron ACPI device.
pub struct PegatronLaptop {
    device: Box<dyn AcpiDevice>,
    config: DriverConfig,
    translator: Option<Translator>,
    subscription: WmiSubscription,
    state: AttachState,
}

impl PegatronLaptop {
    /// Runs the attach sequence against `device`.
    pub fn attach(
        device: Box<dyn AcpiDevice>,
        wmi: &dyn WmiBus,
        input: &dyn InputBackend,
        config: DriverConfig,
    ) -> Result<Self> {
        let uid = device.unique_id().to_string();
        let mut state = AttachState::Uninitialized;

        match Self::run_attach(&*device, wmi, input, &config, &mut state) {
            Ok((translator, subscription)) => {
                tracing::info!(target: "pegatron::acpi", device = %uid, "attached");
                Ok(Self {
                    device,
                    config,
                    translator: Some(translator),
                    subscription,
                    state,
                })
            }
            Err(err) => {
                tracing::error!(
                    target: "pegatron::acpi",
                    device = %uid,
                    reached = ?state,
                    "attach failed: {err}"
                );
                advance(&mut state, AttachState::Failed);
                Err(err)
            }
        }
    }

    fn run_attach(
        device: &dyn AcpiDevice,
        wmi: &dyn WmiBus,
        input: &dyn InputBackend,
        config: &DriverConfig,
        state: &mut AttachState,
    ) -> Result<(Translator, WmiSubscription)> {
        let keymap = config.keymap()?;

        init_firmware(device, config)?;
        advance(state, AttachState::FirmwareInitialized);

        let handle = InputHandle::register(input, config.input_meta(Some(device.unique_id())), &keymap)?;
        let translator = Translator::new(keymap, handle);
        advance(state, AttachState::InputReady);

        let mut subscription = WmiSubscription::new();
        if let Some(guid) = &config.wmi_event_guid {
            if let Err(err) = subscription.subscribe(wmi, guid, translator.clone()) {
                tracing::warn!(
                    target: "pegatron::acpi",
                    "{err}; continuing without WMI hotkey notifications"
                );
            }
        }
        advance(state, AttachState::Attached);

        Ok((translator, subscription))
    }

    /// Unsubscribes, then unregisters and frees the input device.
    ///
    /// Calling it again after a completed detach does nothing. If the firmware
    /// refused to remove the WMI handler, a later call retries that removal.
    pub fn detach(&mut self, wmi: &dyn WmiBus) {
        if self.state == AttachState::Detached {
            if self.subscription.is_subscribed() {
                self.subscription.unsubscribe(wmi);
            }
            return;
        }
        tracing::info!(target: "pegatron::acpi", device = %self.device.unique_id(), "removing acpi data");

        self.subscription.unsubscribe(wmi);
        if let Some(translator) = self.translator.take() {
            translator.release_input();
        }
        advance(&mut self.state, AttachState::Detached);
    }

    /// Plain ACPI notify: log the event and translate it.
    pub fn notify(&self, event: u32) -> Option<Translation> {
        tracing::info!(target: "pegatron::acpi", "event found: 0x{event:02x}");
        self.translator
            .as_ref()
            .map(|t| t.translate_and_report(event))
    }

    pub fn device(&self) -> &dyn AcpiDevice {
        &*self.device
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> AttachState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_subscribed()
    }

    pub fn translator(&self) -> Option<&Translator> {
        self.translator.as_ref()
    }

    pub fn wlan_status(&self) -> WlanStatus {
        self.translator
            .as_ref()
            .map(Translator::wlan_status)
            .unwrap_or_default()
    }

    pub fn status(&self) -> DriverStatus {
        DriverStatus {
            hardware_id: self.device.hardware_id().to_string(),
            unique_id: self.device.unique_id().to_string(),
            state: self.state,
            wlan: self.wlan_status(),
            wmi_subscribed: self.subscription.is_subscribed(),
            wmi_guid: self.subscription.guid().map(str::to_string),
            input: self.translator.as_ref().and_then(Translator::input_meta),
        }
    }
}

impl Drop for PegatronLaptop {
    fn drop(&mut self) {
        if let Some(translator) = self.translator.take() {
            if translator.release_input() {
                tracing::warn!(
                    target: "pegatron::acpi",
                    device = %self.device.unique_id(),
                    "dropped without detach; input device released"
                );
            }
        }
    }
}

impl std::fmt::Debug for PegatronLaptop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PegatronLaptop")
            .field("device", &self.device.unique_id())
            .field("state", &self.state)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

fn init_firmware(device: &dyn AcpiDevice, config: &DriverConfig) -> Result<()> {
    let method = config.init_method.as_str();
    if !device.has_method(method) {
        return Err(DriverError::MethodNotFound {
            method: method.to_string(),
        });
    }
    device
        .execute_simple_method(method, config.init_magic)
        .map_err(|status| DriverError::FirmwareCall {
            method: method.to_string(),
            status,
        })
}

fn advance(state: &mut AttachState, next: AttachState) {
    tracing::debug!(target: "pegatron::acpi", from = ?*state, to = ?next, "state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{FailAt, VirtualAcpiDevice, VirtualInputBackend, VirtualWmiBus};
    use crate::firmware::AcpiStatus;
    use crate::keymap::KeyCode;

    const GUID: &str = "ABBC0F72-8EA1-11D1-00A0-C90629100000";

    #[test]
    fn attach_runs_init_with_magic_and_registers_input() {
        let acpi = VirtualAcpiDevice::pegatron();
        let input = VirtualInputBackend::new();
        let laptop = PegatronLaptop::attach(
            Box::new(acpi.clone()),
            &VirtualWmiBus::new(),
            &input,
            DriverConfig::default(),
        )
        .unwrap();

        assert_eq!(laptop.state(), AttachState::Attached);
        assert_eq!(acpi.calls()[0].arg, 0x55AA66BB);
        assert_eq!(input.registered_devices(), 1);
        assert!(!laptop.is_subscribed());

        let meta = laptop.status().input.unwrap();
        assert_eq!(meta.name, "Pegatron laptop extra buttons");
        assert_eq!(meta.phys, "pegatron-laptop/input0");
        assert_eq!(meta.parent.as_deref(), Some("PTK0001:00"));
    }

    #[test]
    fn keymap_error_fails_before_touching_firmware() {
        let acpi = VirtualAcpiDevice::pegatron();
        let input = VirtualInputBackend::new();
        let mut config = DriverConfig::default();
        config.keymap = Some(vec![
            crate::keymap::KeyEntry::key(1, KeyCode::KEY_WLAN),
            crate::keymap::KeyEntry::key(1, KeyCode::KEY_PROG2),
        ]);

        let err = PegatronLaptop::attach(Box::new(acpi.clone()), &VirtualWmiBus::new(), &input, config)
            .unwrap_err();
        assert!(matches!(err, DriverError::DuplicateScanCode(1)));
        assert!(acpi.calls().is_empty());
        assert_eq!(input.allocations(), 0);
    }

    #[test]
    fn keymap_setup_failure_frees_the_allocated_device() {
        let acpi = VirtualAcpiDevice::pegatron();
        let input = VirtualInputBackend::new();
        input.fail_at(Some(FailAt::Keymap));

        let err = PegatronLaptop::attach(
            Box::new(acpi),
            &VirtualWmiBus::new(),
            &input,
            DriverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::InputRegistration(_)));
        assert_eq!(input.allocations(), 1);
        assert_eq!(input.live_devices(), 0);
    }

    #[test]
    fn firmware_failure_status_is_fatal() {
        let acpi = VirtualAcpiDevice::pegatron().with_method("INIT", AcpiStatus::AE_ERROR);
        let input = VirtualInputBackend::new();

        let err = PegatronLaptop::attach(
            Box::new(acpi),
            &VirtualWmiBus::new(),
            &input,
            DriverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DriverError::FirmwareCall {
                status: AcpiStatus::AE_ERROR,
                ..
            }
        ));
        assert_eq!(input.allocations(), 0);
    }

    #[test]
    fn detach_is_idempotent() {
        let wmi = VirtualWmiBus::new().with_guid(GUID);
        let input = VirtualInputBackend::new();
        let mut laptop = PegatronLaptop::attach(
            Box::new(VirtualAcpiDevice::pegatron()),
            &wmi,
            &input,
            DriverConfig::default().with_wmi_guid(GUID),
        )
        .unwrap();
        assert!(laptop.is_subscribed());

        laptop.detach(&wmi);
        laptop.detach(&wmi);

        assert_eq!(laptop.state(), AttachState::Detached);
        assert_eq!(wmi.handler_count(), 0);
        assert_eq!(input.live_devices(), 0);
        assert_eq!(laptop.notify(0xf1), None);
    }

    #[test]
    fn dropping_without_detach_still_frees_input() {
        let input = VirtualInputBackend::new();
        let laptop = PegatronLaptop::attach(
            Box::new(VirtualAcpiDevice::pegatron()),
            &VirtualWmiBus::new(),
            &input,
            DriverConfig::default(),
        )
        .unwrap();
        assert_eq!(input.live_devices(), 1);
        drop(laptop);
        assert_eq!(input.live_devices(), 0);
    }

    #[test]
    fn detach_retries_a_refused_handler_removal() {
        let wmi = VirtualWmiBus::new().with_guid(GUID);
        let input = VirtualInputBackend::new();
        let mut laptop = PegatronLaptop::attach(
            Box::new(VirtualAcpiDevice::pegatron()),
            &wmi,
            &input,
            DriverConfig::default().with_wmi_guid(GUID),
        )
        .unwrap();

        wmi.fail_remove(Some(AcpiStatus::AE_ERROR));
        laptop.detach(&wmi);
        assert_eq!(laptop.state(), AttachState::Detached);
        assert_eq!(input.live_devices(), 0);
        assert!(laptop.is_subscribed());
        assert!(wmi.has_handler(GUID));

        wmi.fail_remove(None);
        laptop.detach(&wmi);
        assert!(!laptop.is_subscribed());
        assert_eq!(wmi.handler_count(), 0);
    }
}
