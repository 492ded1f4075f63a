//! Logical input events.
//!
//! The driver reports hotkeys as small, device-agnostic key deltas ([`InputKind`]),
//! timestamped and tagged with the reporting input device ([`HotkeyEvent`]).
//!
//! ## Conventions
//! - A translated hotkey produces exactly one [`InputKind::KeyPressed`], followed by an
//!   [`InputKind::Sync`] marker closing the report. `Sync` is not a key event.
//! - `device` is the input device's `phys` string (e.g. `"pegatron-laptop/input0"`),
//!   which is also what [`EventFilter`](crate::eventbus::EventFilter) tags match on.

use crate::keymap::KeyCode;

/// Per-device input change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// A key transitioned to pressed.
    KeyPressed { code: KeyCode },

    /// A key transitioned to released.
    KeyReleased { code: KeyCode },

    /// End of one report (`EV_SYN/SYN_REPORT`).
    Sync,
}

impl InputKind {
    /// Key code for key events, `None` for sync markers.
    pub fn keycode(&self) -> Option<KeyCode> {
        match *self {
            InputKind::KeyPressed { code } | InputKind::KeyReleased { code } => Some(code),
            InputKind::Sync => None,
        }
    }

    #[inline]
    pub fn is_key(&self) -> bool {
        self.keycode().is_some()
    }
}

/// Timestamped input event as seen by listeners.
#[derive(Clone, Debug)]
pub struct HotkeyEvent {
    /// Capture time (monotonic).
    pub at: std::time::Instant,
    /// `phys` of the input device that reported the event.
    pub device: String,
    pub kind: InputKind,
}

impl HotkeyEvent {
    pub fn now(device: impl Into<String>, kind: InputKind) -> Self {
        Self {
            at: std::time::Instant::now(),
            device: device.into(),
            kind,
        }
    }
}
