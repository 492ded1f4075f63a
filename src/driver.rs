//! The Pegatron ACPI driver.

use crate::config::DriverConfig;
use crate::device::{DriverInfo, HostDriver};
use crate::error::{DriverError, Result};
use crate::firmware::{AcpiDevice, WmiBus};
use crate::input::InputBackend;
use crate::laptop::PegatronLaptop;
use crate::snapshot::DriverStatus;
use std::collections::HashMap;

pub const DRIVER_NAME: &str = "Pegatron ACPI";
pub const DRIVER_CLASS: &str = "Pegatron";

/// Binds [`PegatronLaptop`] state to every matching ACPI device.
pub struct PegatronDriver {
    info: DriverInfo,
    config: DriverConfig,
    wmi: Box<dyn WmiBus>,
    input: Box<dyn InputBackend>,
    devices: HashMap<String, PegatronLaptop>,
}

impl PegatronDriver {
    pub fn new(
        config: DriverConfig,
        wmi: impl WmiBus + 'static,
        input: impl InputBackend + 'static,
    ) -> Self {
        Self {
            info: DriverInfo {
                name: DRIVER_NAME.into(),
                class: DRIVER_CLASS.into(),
                ids: config.hardware_ids.clone(),
            },
            config,
            wmi: Box::new(wmi),
            input: Box::new(input),
            devices: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn laptop(&self, unique_id: &str) -> Option<&PegatronLaptop> {
        self.devices.get(unique_id)
    }
}

impl HostDriver for PegatronDriver {
    fn info(&self) -> &DriverInfo {
        &self.info
    }

    fn on_attach(&mut self, device: Box<dyn AcpiDevice>) -> Result<()> {
        let uid = device.unique_id().to_string();
        if self.devices.contains_key(&uid) {
            return Err(DriverError::AlreadyBound(uid));
        }
        let laptop = PegatronLaptop::attach(device, &*self.wmi, &*self.input, self.config.clone())?;
        self.devices.insert(uid, laptop);
        Ok(())
    }

    fn on_detach(&mut self, unique_id: &str) -> Result<()> {
        let mut laptop = self
            .devices
            .remove(unique_id)
            .ok_or_else(|| DriverError::UnknownDevice(unique_id.to_string()))?;
        laptop.detach(&*self.wmi);
        Ok(())
    }

    fn on_notify(&mut self, unique_id: &str, event: u32) {
        match self.devices.get(unique_id) {
            Some(laptop) => {
                laptop.notify(event);
            }
            None => tracing::warn!(
                target: "pegatron::acpi",
                device = unique_id,
                "notify 0x{event:02x} for unbound device"
            ),
        }
    }

    fn bound_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn status(&self, unique_id: &str) -> Option<DriverStatus> {
        self.devices.get(unique_id).map(PegatronLaptop::status)
    }
}

impl Drop for PegatronDriver {
    fn drop(&mut self) {
        for (_, mut laptop) in self.devices.drain() {
            laptop.detach(&*self.wmi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{VirtualAcpiDevice, VirtualInputBackend, VirtualWmiBus};

    #[test]
    fn binds_and_unbinds_devices() {
        let input = VirtualInputBackend::new();
        let mut driver = PegatronDriver::new(DriverConfig::default(), VirtualWmiBus::new(), input.clone());
        assert!(driver.info().matches("PTK0001"));

        driver.on_attach(Box::new(VirtualAcpiDevice::pegatron())).unwrap();
        assert_eq!(driver.bound_devices(), vec!["PTK0001:00".to_string()]);

        let err = driver
            .on_attach(Box::new(VirtualAcpiDevice::pegatron()))
            .unwrap_err();
        assert!(matches!(err, DriverError::AlreadyBound(_)));

        driver.on_detach("PTK0001:00").unwrap();
        assert!(driver.bound_devices().is_empty());
        assert_eq!(input.live_devices(), 0);
        assert!(matches!(
            driver.on_detach("PTK0001:00"),
            Err(DriverError::UnknownDevice(_))
        ));
    }

    #[test]
    fn dropping_the_driver_detaches_everything() {
        let input = VirtualInputBackend::new();
        let wmi = VirtualWmiBus::new().with_guid("G");
        {
            let mut driver = PegatronDriver::new(
                DriverConfig::default().with_wmi_guid("G"),
                wmi.clone(),
                input.clone(),
            );
            driver.on_attach(Box::new(VirtualAcpiDevice::pegatron())).unwrap();
            assert_eq!(wmi.handler_count(), 1);
        }
        assert_eq!(wmi.handler_count(), 0);
        assert_eq!(input.live_devices(), 0);
    }
}
