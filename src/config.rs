//! Driver configuration.
//!
//! Every field has a Pegatron default, so an empty TOML document is a valid config:
//!
//! ```toml
//! hardware_ids = ["PTK0001"]
//! init_method = "INIT"
//! init_magic = 0x55AA66BB
//! input_name = "Pegatron laptop extra buttons"
//! input_phys = "pegatron-laptop/input0"
//! wmi_event_guid = "..."            # optional; no WMI subscription when absent
//!
//! [[keymap]]                         # optional; replaces the stock table
//! code = 0xF1
//! keycode = 238
//! ```

use crate::error::{DriverError, Result};
use crate::keymap::{KeyEntry, Keymap};
use crate::metadata::{InputDeviceMeta, BUS_HOST, MODULE_NAME};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PEGATRON_DEVICE_ID: &str = "PTK0001";

/// Argument the EC expects for `INIT`.
pub const PEGATRON_INIT_MAGIC: u32 = 0x55AA_66BB;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// `_HID`s this driver binds to.
    pub hardware_ids: Vec<String>,
    pub init_method: String,
    pub init_magic: u32,
    pub input_name: String,
    pub input_phys: String,
    pub bus_type: u16,
    /// Vendor WMI event GUID to subscribe to.
    pub wmi_event_guid: Option<String>,
    /// Replacement keymap.
    pub keymap: Option<Vec<KeyEntry>>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            hardware_ids: vec![PEGATRON_DEVICE_ID.to_string()],
            init_method: "INIT".into(),
            init_magic: PEGATRON_INIT_MAGIC,
            input_name: "Pegatron laptop extra buttons".into(),
            input_phys: format!("{MODULE_NAME}/input0"),
            bus_type: BUS_HOST,
            wmi_event_guid: None,
            keymap: None,
        }
    }
}

impl DriverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: DriverConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// Builder-style helper for the common "defaults plus a WMI GUID" case.
    pub fn with_wmi_guid(mut self, guid: impl Into<String>) -> Self {
        self.wmi_event_guid = Some(guid.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.hardware_ids.is_empty() {
            return Err(DriverError::Config("hardware_ids must not be empty".into()));
        }
        if self.init_method.is_empty() {
            return Err(DriverError::Config("init_method must not be empty".into()));
        }
        if matches!(self.wmi_event_guid.as_deref(), Some("")) {
            return Err(DriverError::Config("wmi_event_guid must not be empty".into()));
        }
        self.keymap().map(|_| ())
    }

    /// The keymap to install: the configured one, or the stock Pegatron table.
    pub fn keymap(&self) -> Result<Keymap> {
        match &self.keymap {
            Some(entries) => Keymap::new(entries.clone()),
            None => Ok(Keymap::pegatron()),
        }
    }

    pub fn input_meta(&self, parent: Option<&str>) -> InputDeviceMeta {
        InputDeviceMeta {
            name: self.input_name.clone(),
            phys: self.input_phys.clone(),
            bus_type: self.bus_type,
            parent: parent.map(str::to_string),
        }
    }

    pub fn matches(&self, hardware_id: &str) -> bool {
        self.hardware_ids.iter().any(|id| id == hardware_id)
    }
}
