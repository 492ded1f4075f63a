//! Logical input sink.
//!
//! [`InputBackend`] allocates input devices; [`InputDevice`] is one allocated device.
//! Dropping the boxed device frees it. [`InputHandle`] is the driver's exclusive,
//! registered handle: it unregisters the device exactly once, when dropped.

use crate::error::InputError;
use crate::keymap::{KeyCode, Keymap};
use crate::metadata::InputDeviceMeta;

pub trait InputBackend {
    fn allocate(&self, meta: &InputDeviceMeta) -> Result<Box<dyn InputDevice>, InputError>;
}

pub trait InputDevice: Send {
    /// Installs the sparse keymap (declares the `EV_KEY` capabilities).
    fn setup_keymap(&mut self, keymap: &Keymap) -> Result<(), InputError>;

    fn register(&mut self) -> Result<(), InputError>;

    fn report_key(&mut self, code: KeyCode, pressed: bool);

    fn sync(&mut self);

    fn unregister(&mut self);
}

/// Registered input device owned by the driver.
pub struct InputHandle {
    dev: Box<dyn InputDevice>,
    meta: InputDeviceMeta,
}

impl InputHandle {
    /// Allocates, installs `keymap`, and registers a device.
    ///
    /// On failure everything acquired so far is released before returning.
    pub fn register(
        backend: &dyn InputBackend,
        meta: InputDeviceMeta,
        keymap: &Keymap,
    ) -> Result<Self, InputError> {
        tracing::info!(target: "pegatron::input", name = %meta.name, "initializing input device");

        let mut dev = backend.allocate(&meta).map_err(|e| {
            tracing::warn!(target: "pegatron::input", "failed to allocate input device");
            e
        })?;

        if let Err(e) = dev.setup_keymap(keymap) {
            tracing::warn!(target: "pegatron::input", error = %e, "unable to setup keymap");
            return Err(e);
        }

        if let Err(e) = dev.register() {
            tracing::warn!(target: "pegatron::input", error = %e, "unable to register input device");
            return Err(e);
        }

        Ok(Self { dev, meta })
    }

    pub fn meta(&self) -> &InputDeviceMeta {
        &self.meta
    }

    /// Reports one key transition and closes the report.
    pub fn emit_key(&mut self, code: KeyCode, pressed: bool) {
        self.dev.report_key(code, pressed);
        self.dev.sync();
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        tracing::debug!(target: "pegatron::input", phys = %self.meta.phys, "unregistering input device");
        self.dev.unregister();
    }
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle").field("meta", &self.meta).finish()
    }
}
