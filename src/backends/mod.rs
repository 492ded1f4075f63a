//! Platform backends for the driver.
//!
//! Implementations of [`AcpiDevice`](crate::firmware::AcpiDevice),
//! [`WmiBus`](crate::firmware::WmiBus) and [`InputBackend`](crate::input::InputBackend).
//!
//! Only the in-memory [`virtual_input`] backend ships with the crate. Real hosts
//! provide a thin adapter over their own ACPI/WMI/input APIs.

pub mod virtual_input;

pub use virtual_input::{
    FailAt, MethodCall, VirtualAcpiDevice, VirtualInputBackend, VirtualInputDevice, VirtualWmiBus,
};
