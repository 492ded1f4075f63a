//! Sparse hotkey keymap.
//!
//! Maps raw firmware scan codes (as delivered by the EC through ACPI/WMI) to Linux
//! input key codes. The table is immutable once built: lookups are a linear scan in
//! table order, and adding a code only means adding an entry.
//!
//! The default Pegatron table:
//!
//! | scan code | key                   | purpose              |
//! |-----------|-----------------------|----------------------|
//! | `0xF1`    | `KEY_WLAN`            | WLAN on/off          |
//! | `0xF3`    | `KEY_PROG2`           | Smart battery        |
//! | `0xF8`    | `KEY_TOUCHPAD_TOGGLE` | Touchpad lock        |

use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Linux evdev key code (`KEY_*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct KeyCode(u16);

impl KeyCode {
    pub const KEY_PROG2: Self = Self(149);
    pub const KEY_WLAN: Self = Self(238);
    pub const KEY_TOUCHPAD_TOGGLE: Self = Self(0x212);

    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Symbolic name for the codes this driver knows about.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::KEY_PROG2 => Some("KEY_PROG2"),
            Self::KEY_WLAN => Some("KEY_WLAN"),
            Self::KEY_TOUCHPAD_TOGGLE => Some("KEY_TOUCHPAD_TOGGLE"),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}

/// Kind of a keymap entry. Only plain keys are used by this hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEntryKind {
    Key,
}

/// One `(scan code → key)` mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub code: u32,
    #[serde(default = "default_kind")]
    pub kind: KeyEntryKind,
    pub keycode: KeyCode,
}

fn default_kind() -> KeyEntryKind {
    KeyEntryKind::Key
}

impl KeyEntry {
    pub const fn key(code: u32, keycode: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEntryKind::Key,
            keycode,
        }
    }
}

const PEGATRON_KEYMAP: [KeyEntry; 3] = [
    KeyEntry::key(0xf1, KeyCode::KEY_WLAN),            // WLAN on/off hotkey
    KeyEntry::key(0xf3, KeyCode::KEY_PROG2),           // Smart battery hotkey
    KeyEntry::key(0xf8, KeyCode::KEY_TOUCHPAD_TOGGLE), // TouchPad lock hotkey
];

/// Immutable, ordered keymap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keymap {
    entries: Vec<KeyEntry>,
}

impl Keymap {
    /// Builds a keymap, rejecting tables that list a scan code twice.
    pub fn new(entries: Vec<KeyEntry>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.code) {
                return Err(DriverError::DuplicateScanCode(entry.code));
            }
        }
        Ok(Self { entries })
    }

    /// The stock Pegatron hotkey table.
    pub fn pegatron() -> Self {
        Self {
            entries: PEGATRON_KEYMAP.to_vec(),
        }
    }

    /// Finds the entry for a raw scan code.
    pub fn lookup(&self, code: u32) -> Option<&KeyEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    #[inline]
    pub fn keycode_for(&self, code: u32) -> Option<KeyCode> {
        self.lookup(code).map(|e| e.keycode)
    }

    pub fn contains_keycode(&self, keycode: KeyCode) -> bool {
        self.entries.iter().any(|e| e.keycode == keycode)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::pegatron()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_mapped_keys() {
        let km = Keymap::pegatron();
        assert_eq!(km.keycode_for(0xf1), Some(KeyCode::KEY_WLAN));
        assert_eq!(km.keycode_for(0xf3), Some(KeyCode::KEY_PROG2));
        assert_eq!(km.keycode_for(0xf8), Some(KeyCode::KEY_TOUCHPAD_TOGGLE));
    }

    #[test]
    fn lookup_misses_everything_else() {
        let km = Keymap::pegatron();
        for code in (0u32..=0x1ff).filter(|c| ![0xf1, 0xf3, 0xf8].contains(c)) {
            assert!(km.lookup(code).is_none(), "0x{code:x} should be unmapped");
        }
        assert!(km.lookup(u32::MAX).is_none());
    }

    #[test]
    fn iteration_order_is_table_order() {
        let codes: Vec<u32> = Keymap::pegatron().iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![0xf1, 0xf3, 0xf8]);
    }

    #[test]
    fn duplicate_scan_codes_are_rejected() {
        let err = Keymap::new(vec![
            KeyEntry::key(0xf1, KeyCode::KEY_WLAN),
            KeyEntry::key(0xf1, KeyCode::KEY_PROG2),
        ])
        .unwrap_err();
        assert!(matches!(err, DriverError::DuplicateScanCode(0xf1)));
    }

    #[test]
    fn extra_entries_need_no_other_changes() {
        let mut entries: Vec<KeyEntry> = Keymap::pegatron().iter().copied().collect();
        entries.push(KeyEntry::key(0xf9, KeyCode::from_u16(0x1d2)));
        let km = Keymap::new(entries).unwrap();
        assert_eq!(km.keycode_for(0xf9), Some(KeyCode::from_u16(0x1d2)));
        assert_eq!(km.len(), 4);
    }

    #[test]
    fn keycode_display_uses_symbolic_names() {
        assert_eq!(KeyCode::KEY_WLAN.to_string(), "KEY_WLAN");
        assert_eq!(KeyCode::from_u16(0x1d2).to_string(), "0x01d2");
    }
}
