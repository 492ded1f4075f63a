//! Firmware-side interfaces consumed by the driver.
//!
//! The driver never talks to ACPI or WMI directly. Everything it needs from the
//! platform goes through two small traits:
//!
//! - [`AcpiDevice`]: the ACPI namespace node the driver is bound to (method lookup
//!   and `acpi_execute_simple_method`-style invocation).
//! - [`WmiBus`]: the vendor WMI event channel (GUID lookup, notify handler
//!   install/remove, and per-event data retrieval).
//!
//! Host adapters implement these for the real platform; [`crate::backends::virtual_input`]
//! provides in-memory versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// ACPICA status code (`acpi_status`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcpiStatus(u32);

#[allow(non_upper_case_globals)]
impl AcpiStatus {
    pub const AE_OK: Self = Self(0x0000);
    pub const AE_ERROR: Self = Self(0x0001);
    pub const AE_NO_MEMORY: Self = Self(0x0004);
    pub const AE_NOT_FOUND: Self = Self(0x0005);
    pub const AE_NOT_EXIST: Self = Self(0x0006);
    pub const AE_ALREADY_EXISTS: Self = Self(0x0007);
    pub const AE_TYPE: Self = Self(0x0008);
    pub const AE_BAD_PARAMETER: Self = Self(0x1001);

    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Converts a raw status into a `Result`, `AE_OK` being the only success.
    pub fn into_result(self) -> Result<(), AcpiStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::AE_OK => "AE_OK",
            Self::AE_ERROR => "AE_ERROR",
            Self::AE_NO_MEMORY => "AE_NO_MEMORY",
            Self::AE_NOT_FOUND => "AE_NOT_FOUND",
            Self::AE_NOT_EXIST => "AE_NOT_EXIST",
            Self::AE_ALREADY_EXISTS => "AE_ALREADY_EXISTS",
            Self::AE_TYPE => "AE_TYPE",
            Self::AE_BAD_PARAMETER => "AE_BAD_PARAMETER",
            _ => return None,
        })
    }
}

impl fmt::Display for AcpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#06x})", self.0),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}

/// Evaluated ACPI object, as returned inside a WMI event buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcpiObject {
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
    Package(Vec<AcpiObject>),
}

impl AcpiObject {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            AcpiObject::Integer(_) => "integer",
            AcpiObject::String(_) => "string",
            AcpiObject::Buffer(_) => "buffer",
            AcpiObject::Package(_) => "package",
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            AcpiObject::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// Firmware-owned buffer describing one WMI event.
///
/// The buffer is released when the guard is dropped, whichever branch the caller
/// takes. The object inside may be absent (firmware returned an empty buffer).
pub struct EventBuffer<'a> {
    object: Option<AcpiObject>,
    release: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> EventBuffer<'a> {
    /// A buffer with nothing to give back on drop.
    pub fn new(object: Option<AcpiObject>) -> Self {
        Self {
            object,
            release: None,
        }
    }

    /// A buffer whose `release` runs exactly once, when the guard is dropped.
    pub fn with_release(object: Option<AcpiObject>, release: impl FnOnce() + 'a) -> Self {
        Self {
            object,
            release: Some(Box::new(release)),
        }
    }

    pub fn object(&self) -> Option<&AcpiObject> {
        self.object.as_ref()
    }
}

impl Drop for EventBuffer<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for EventBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuffer")
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

/// ACPI device node the driver binds to.
pub trait AcpiDevice: Send {
    /// `_HID` of the node (e.g. `"PTK0001"`).
    fn hardware_id(&self) -> &str;

    /// Unique instance name (e.g. `"PTK0001:00"`), used as the registry key.
    fn unique_id(&self) -> &str;

    fn has_method(&self, name: &str) -> bool;

    /// Evaluates `name` with a single integer argument.
    fn execute_simple_method(&self, name: &str, arg: u32) -> Result<(), AcpiStatus>;
}

/// Callback invoked for each WMI notification: `(bus, event value)`.
///
/// The bus is passed back in so the handler can fetch the event data without
/// keeping its own reference to it.
pub type NotifyHandler = Arc<dyn Fn(&dyn WmiBus, u32) + Send + Sync>;

/// Vendor WMI event channel.
pub trait WmiBus {
    fn has_guid(&self, guid: &str) -> bool;

    /// Fails with `AE_ALREADY_EXISTS` if a handler is installed for `guid`,
    /// `AE_NOT_EXIST` if the GUID is unknown.
    fn install_notify_handler(&self, guid: &str, handler: NotifyHandler) -> Result<(), AcpiStatus>;

    fn remove_notify_handler(&self, guid: &str) -> Result<(), AcpiStatus>;

    fn get_event_data(&self, value: u32) -> Result<EventBuffer<'_>, AcpiStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn status_display_names_known_codes() {
        assert_eq!(AcpiStatus::AE_NOT_FOUND.to_string(), "AE_NOT_FOUND (0x0005)");
        assert_eq!(AcpiStatus::from_code(0x2222).to_string(), "0x2222");
        assert!(AcpiStatus::AE_OK.into_result().is_ok());
        assert_eq!(
            AcpiStatus::AE_ERROR.into_result(),
            Err(AcpiStatus::AE_ERROR)
        );
    }

    #[test]
    fn event_buffer_releases_once_on_drop() {
        let released = Cell::new(0);
        {
            let buf = EventBuffer::with_release(Some(AcpiObject::Integer(0xf1)), || {
                released.set(released.get() + 1)
            });
            assert_eq!(buf.object().and_then(AcpiObject::as_integer), Some(0xf1));
            assert_eq!(released.get(), 0);
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn non_integer_objects_have_no_integer_value() {
        let obj = AcpiObject::Buffer(vec![0xf1]);
        assert_eq!(obj.as_integer(), None);
        assert_eq!(obj.type_name(), "buffer");
    }
}
