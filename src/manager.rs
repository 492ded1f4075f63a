//! Driver registry.
//!
//! [`DriverRegistry`] stands in for the host's driver table: drivers are registered
//! into an explicit registry object instead of a process-wide singleton, devices are
//! bound to the first driver whose id table lists their `_HID`, and notifications are
//! routed to whichever driver owns the device.

use crate::device::HostDriver;
use crate::error::{DriverError, Result};
use crate::firmware::AcpiDevice;
use crate::snapshot::Snapshot;
use std::collections::HashMap;

#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Box<dyn HostDriver>>,
    bindings: HashMap<String, String>, // device unique id -> driver name
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module init: makes `driver` available for binding.
    pub fn register_driver<D: HostDriver + 'static>(&mut self, driver: D) -> Result<()> {
        let name = driver.info().name.clone();
        if self.driver_index(&name).is_some() {
            tracing::error!(target: "pegatron", driver = %name, "could not insert device driver");
            return Err(DriverError::DriverExists(name));
        }
        tracing::info!(target: "pegatron", driver = %name, "ACPI/WMI module loaded");
        self.drivers.push(Box::new(driver));
        Ok(())
    }

    /// Module exit: detaches every device bound to `name`, then drops the driver.
    pub fn unregister_driver(&mut self, name: &str) -> Result<()> {
        let idx = self
            .driver_index(name)
            .ok_or_else(|| DriverError::UnknownDriver(name.to_string()))?;

        let bound: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, drv)| drv.as_str() == name)
            .map(|(uid, _)| uid.clone())
            .collect();
        for uid in bound {
            self.bindings.remove(&uid);
            if let Err(err) = self.drivers[idx].on_detach(&uid) {
                tracing::warn!(target: "pegatron", device = %uid, "detach during unload failed: {err}");
            }
        }

        self.drivers.remove(idx);
        tracing::info!(target: "pegatron", driver = name, "unloading ACPI/WMI device");
        Ok(())
    }

    /// Binds `device` to the first driver matching its hardware id.
    pub fn add_device<A: AcpiDevice + 'static>(&mut self, device: A) -> Result<()> {
        let hid = device.hardware_id().to_string();
        let uid = device.unique_id().to_string();

        if self.bindings.contains_key(&uid) {
            return Err(DriverError::AlreadyBound(uid));
        }
        let driver = self
            .drivers
            .iter_mut()
            .find(|d| d.info().matches(&hid))
            .ok_or(DriverError::NoDriver { hardware_id: hid })?;

        driver.on_attach(Box::new(device))?;
        self.bindings.insert(uid, driver.info().name.clone());
        Ok(())
    }

    pub fn remove_device(&mut self, unique_id: &str) -> Result<()> {
        let driver = self.bound_driver(unique_id)?;
        let result = driver.on_detach(unique_id);
        self.bindings.remove(unique_id);
        result
    }

    /// Routes an ACPI notify to the owning driver.
    pub fn notify(&mut self, unique_id: &str, event: u32) -> Result<()> {
        self.bound_driver(unique_id)?.on_notify(unique_id, event);
        Ok(())
    }

    pub fn drivers(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.info().name.as_str()).collect()
    }

    pub fn bound_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bindings.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn driver_for(&self, unique_id: &str) -> Option<&str> {
        self.bindings.get(unique_id).map(String::as_str)
    }

    /// Status of every bound device.
    pub fn snapshot(&self) -> Snapshot {
        let mut map = HashMap::new();
        for (uid, name) in &self.bindings {
            let status = self
                .driver_index(name)
                .and_then(|idx| self.drivers[idx].status(uid));
            if let Some(status) = status {
                map.insert(uid.clone(), status);
            }
        }
        Snapshot(map)
    }

    fn driver_index(&self, name: &str) -> Option<usize> {
        self.drivers.iter().position(|d| d.info().name == name)
    }

    fn bound_driver(&mut self, unique_id: &str) -> Result<&mut Box<dyn HostDriver>> {
        let name = self
            .bindings
            .get(unique_id)
            .ok_or_else(|| DriverError::UnknownDevice(unique_id.to_string()))?;
        let idx = self
            .driver_index(name)
            .ok_or_else(|| DriverError::UnknownDevice(unique_id.to_string()))?;
        Ok(&mut self.drivers[idx])
    }
}
