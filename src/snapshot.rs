//! Driver status snapshots.
//!
//! [`DriverStatus`] is an owned, read-only view of one bound device: where it is in
//! the attach lifecycle, the WLAN flag, whether the WMI channel is live, and the
//! registered input device. [`Snapshot`] collects them for every device a
//! [`DriverRegistry`](crate::manager::DriverRegistry) has bound.
//!
//! Both serialize with serde; [`DriverStatus::to_json`] is the form used for
//! diagnostics dumps.

use crate::error::{DriverError, Result};
use crate::metadata::InputDeviceMeta;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// WLAN card status as last toggled by the hotkey.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WlanStatus {
    On,
    #[default]
    Off,
}

impl From<bool> for WlanStatus {
    fn from(on: bool) -> Self {
        if on {
            WlanStatus::On
        } else {
            WlanStatus::Off
        }
    }
}

/// Attach lifecycle position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachState {
    #[default]
    Uninitialized,
    FirmwareInitialized,
    InputReady,
    Attached,
    Detached,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStatus {
    pub hardware_id: String,
    pub unique_id: String,
    pub state: AttachState,
    pub wlan: WlanStatus,
    pub wmi_subscribed: bool,
    pub wmi_guid: Option<String>,
    pub input: Option<InputDeviceMeta>,
}

impl DriverStatus {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DriverError::Config(e.to_string()))
    }
}

/// Owned snapshot of driver status per bound device (`unique_id → status`).
#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot(pub HashMap<String, DriverStatus>);

impl Snapshot {
    #[inline]
    pub fn get(&self, unique_id: &str) -> Option<&DriverStatus> {
        self.0.get(unique_id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DriverStatus)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn into_inner(self) -> HashMap<String, DriverStatus> {
        self.0
    }
}
