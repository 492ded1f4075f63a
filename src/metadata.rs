//! Input device metadata.
//!
//! [`InputDeviceMeta`] is a lightweight, cloneable description of the input device
//! the driver registers, suitable for logging and status output. It mirrors what the
//! host input layer is told at allocation time (`name`, `phys`, `id.bustype`).
//!
//! # Conventions
//! - `phys` is `"<module>/input<N>"` and doubles as the event tag on the
//!   [`InputEventBus`](crate::eventbus::InputEventBus).
//! - `parent` is the unique id of the ACPI device the input device hangs off.

use serde::{Deserialize, Serialize};

/// `BUS_HOST` from `linux/input.h`.
pub const BUS_HOST: u16 = 0x19;

/// Module name used to build the default `phys`.
pub const MODULE_NAME: &str = "pegatron-laptop";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDeviceMeta {
    /// Human-readable device name.
    pub name: String,

    /// Physical path of the device.
    pub phys: String,

    /// Bus type (`id.bustype`).
    pub bus_type: u16,

    /// Unique id of the parent ACPI device, if bound.
    pub parent: Option<String>,
}

impl Default for InputDeviceMeta {
    fn default() -> Self {
        Self {
            name: "Pegatron laptop extra buttons".into(),
            phys: format!("{MODULE_NAME}/input0"),
            bus_type: BUS_HOST,
            parent: None,
        }
    }
}
