//! Scan code → input event translation.
//!
//! [`Translator`] is shared between the device state and the WMI notify handler.
//! The registered [`InputHandle`] lives behind a mutex that is only held while a
//! single key event is emitted. Listeners run inside that emit, so everything else
//! a `Translator` answers (metadata, liveness, WLAN status) is readable without it.

use crate::input::InputHandle;
use crate::keymap::{KeyCode, Keymap};
use crate::lock;
use crate::metadata::InputDeviceMeta;
use crate::snapshot::WlanStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Outcome of translating one scan code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Translation {
    /// A key press was reported for this key.
    Reported(KeyCode),
    /// Nothing was reported. Not an error: the EC sends codes without a key.
    Unhandled(u32),
    /// The code maps to this key, but the input device was already released.
    Dropped(KeyCode),
}

impl Translation {
    pub fn is_reported(&self) -> bool {
        matches!(self, Translation::Reported(_))
    }
}

struct Shared {
    keymap: Keymap,
    meta: InputDeviceMeta,
    input: Mutex<Option<InputHandle>>,
    live: AtomicBool,
    wlan_on: AtomicBool,
}

/// Cloneable handle onto the keymap and the registered input device.
#[derive(Clone)]
pub struct Translator {
    shared: Arc<Shared>,
}

impl Translator {
    pub fn new(keymap: Keymap, input: InputHandle) -> Self {
        Self {
            shared: Arc::new(Shared {
                keymap,
                meta: input.meta().clone(),
                input: Mutex::new(Some(input)),
                live: AtomicBool::new(true),
                wlan_on: AtomicBool::new(false),
            }),
        }
    }

    pub fn keymap(&self) -> &Keymap {
        &self.shared.keymap
    }

    /// Looks `code` up and, on a hit, reports one key press.
    pub fn translate_and_report(&self, code: u32) -> Translation {
        let Some(keycode) = self.shared.keymap.keycode_for(code) else {
            tracing::warn!(target: "pegatron::hotkey", "unknown event code 0x{code:02x}");
            return Translation::Unhandled(code);
        };

        {
            let mut input = lock(&self.shared.input);
            let Some(input) = input.as_mut() else {
                tracing::debug!(
                    target: "pegatron::hotkey",
                    "input device released, dropping event 0x{code:02x}"
                );
                return Translation::Dropped(keycode);
            };
            input.emit_key(keycode, true);
        }

        if keycode == KeyCode::KEY_WLAN {
            let was_on = self.shared.wlan_on.fetch_xor(true, Ordering::SeqCst);
            tracing::debug!(target: "pegatron::hotkey", wlan = ?WlanStatus::from(!was_on), "wlan hotkey");
        }

        tracing::debug!(target: "pegatron::hotkey", key = %keycode, "reported 0x{code:02x}");
        Translation::Reported(keycode)
    }

    pub fn wlan_status(&self) -> WlanStatus {
        WlanStatus::from(self.shared.wlan_on.load(Ordering::SeqCst))
    }

    /// Metadata of the registered input device, `None` once it was released.
    pub fn input_meta(&self) -> Option<InputDeviceMeta> {
        self.has_input().then(|| self.shared.meta.clone())
    }

    pub fn has_input(&self) -> bool {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Unregisters and frees the input device. Returns `false` if it was already gone.
    pub(crate) fn release_input(&self) -> bool {
        self.shared.live.store(false, Ordering::SeqCst);
        let handle = lock(&self.shared.input).take();
        handle.is_some()
    }
}
