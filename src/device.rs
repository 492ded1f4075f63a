use crate::error::Result;
use crate::firmware::AcpiDevice;
use crate::snapshot::DriverStatus;

/// Static description of a driver: name, class and the `_HID`s it binds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverInfo {
    pub name: String,
    pub class: String,
    pub ids: Vec<String>,
}

impl DriverInfo {
    pub fn matches(&self, hardware_id: &str) -> bool {
        self.ids.iter().any(|id| id == hardware_id)
    }
}

/// Entry points the host runtime calls on a driver.
pub trait HostDriver {
    fn info(&self) -> &DriverInfo;

    /// Binds the driver to `device`. On error nothing acquired for the device is retained.
    fn on_attach(&mut self, device: Box<dyn AcpiDevice>) -> Result<()>;

    fn on_detach(&mut self, unique_id: &str) -> Result<()>;

    /// ACPI notify for a bound device. Never fails towards the host.
    fn on_notify(&mut self, unique_id: &str, event: u32);

    fn bound_devices(&self) -> Vec<String>;

    fn status(&self, _unique_id: &str) -> Option<DriverStatus> {
        None
    }
}
