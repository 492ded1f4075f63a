//! Driver error types.
//!
//! Attach-time errors ([`DriverError::MethodNotFound`], [`DriverError::FirmwareCall`],
//! [`DriverError::InputRegistration`]) abort the attach and are returned to the host.
//! [`DriverError::Subscription`] and [`DriverError::BufferAcquisition`] are produced
//! internally, logged, and swallowed: they never reach the host runtime.

use crate::firmware::AcpiStatus;
use thiserror::Error;

/// Linux errno values the host runtime expects back from attach/detach.
pub mod errno {
    pub const ENOMEM: i32 = 12;
    pub const EBUSY: i32 = 16;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
}

/// Failures reported by an [`InputBackend`](crate::input::InputBackend) / [`InputDevice`](crate::input::InputDevice).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("failed to allocate input device")]
    Allocation,

    #[error("unable to set up sparse keymap: {0}")]
    Keymap(String),

    #[error("unable to register input device: {0}")]
    Registration(String),
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// The firmware does not implement a method the driver requires.
    #[error("{method} method not found on DSDT")]
    MethodNotFound { method: String },

    /// A firmware control method ran and returned a failure status.
    #[error("error calling ACPI {method} method: {status}")]
    FirmwareCall { method: String, status: AcpiStatus },

    #[error("input device setup failed: {0}")]
    InputRegistration(#[from] InputError),

    /// Non-fatal: the WMI notify handler could not be installed.
    #[error("cannot subscribe to WMI event {guid}: {reason}")]
    Subscription { guid: String, reason: String },

    /// Non-fatal: the firmware buffer for one notification could not be fetched.
    #[error("bad event status {status} for WMI event 0x{value:x}")]
    BufferAcquisition { value: u32, status: AcpiStatus },

    #[error("scan code 0x{0:02x} appears more than once in keymap")]
    DuplicateScanCode(u32),

    #[error("no driver matches hardware id {hardware_id}")]
    NoDriver { hardware_id: String },

    #[error("device {0} is not bound to any driver")]
    UnknownDevice(String),

    #[error("device {0} is already bound")]
    AlreadyBound(String),

    #[error("driver {0} is not registered")]
    UnknownDriver(String),

    #[error("driver {0} is already registered")]
    DriverExists(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Negative errno reported to the host runtime for this failure.
    pub fn errno(&self) -> i32 {
        let e = match self {
            DriverError::MethodNotFound { .. }
            | DriverError::FirmwareCall { .. }
            | DriverError::NoDriver { .. }
            | DriverError::UnknownDevice(_)
            | DriverError::UnknownDriver(_) => errno::ENODEV,
            DriverError::InputRegistration(InputError::Allocation) => errno::ENOMEM,
            DriverError::Subscription { .. }
            | DriverError::DriverExists(_)
            | DriverError::AlreadyBound(_) => errno::EBUSY,
            DriverError::InputRegistration(_)
            | DriverError::BufferAcquisition { .. }
            | DriverError::DuplicateScanCode(_)
            | DriverError::Config(_)
            | DriverError::Io(_) => errno::EINVAL,
        };
        -e
    }

    /// Whether this error aborts attach. Subscription and per-notification
    /// buffer errors are logged and swallowed.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DriverError::Subscription { .. } | DriverError::BufferAcquisition { .. }
        )
    }
}

impl From<toml::de::Error> for DriverError {
    fn from(err: toml::de::Error) -> Self {
        DriverError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
