//! Pegatron laptop ACPI/WMI hotkey driver.
//!
//! Initializes the embedded controller through the ACPI `INIT` method, exposes the
//! WLAN, smart-battery and touchpad-lock hotkeys as input key events, and optionally
//! listens on a vendor WMI event GUID for more hotkey notifications.
//!
//! The platform is reached only through the traits in [`firmware`] and [`input`];
//! [`backends::virtual_input`] implements them in memory.

pub mod backends;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod firmware;
pub mod input;
pub mod keymap;
pub mod laptop;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod snapshot;
pub mod translator;
pub mod wmi;

pub use config::*;
pub use device::*;
pub use driver::*;
pub use error::{DriverError, InputError, Result};
pub use event::*;
pub use eventbus::*;
pub use keymap::*;
pub use laptop::*;
pub use manager::*;
pub use snapshot::*;
pub use translator::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `m`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
