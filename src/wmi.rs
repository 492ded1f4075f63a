//! WMI hotkey event subscription.
//!
//! A [`WmiSubscription`] is either unsubscribed or subscribed to exactly one event
//! GUID. Transitions only happen through [`WmiSubscription::subscribe`] and
//! [`WmiSubscription::unsubscribe`]; the latter is a no-op when nothing is installed
//! so teardown can call it unconditionally.
//!
//! Each notification fetches the event's firmware buffer, reads an integer scan code
//! out of it and hands that to the [`Translator`]. Failures are logged and dropped.

use crate::error::{DriverError, Result};
use crate::firmware::{AcpiObject, AcpiStatus, NotifyHandler, WmiBus};
use crate::translator::{Translation, Translator};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribed { guid: String },
}

#[derive(Debug, Default)]
pub struct WmiSubscription {
    state: SubscriptionState,
}

impl WmiSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubscriptionState {
        &self.state
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self.state, SubscriptionState::Subscribed { .. })
    }

    pub fn guid(&self) -> Option<&str> {
        match &self.state {
            SubscriptionState::Subscribed { guid } => Some(guid),
            SubscriptionState::Unsubscribed => None,
        }
    }

    /// Installs a notify handler for `guid` that feeds `translator`.
    pub fn subscribe(&mut self, bus: &dyn WmiBus, guid: &str, translator: Translator) -> Result<()> {
        let fail = |reason: String| DriverError::Subscription {
            guid: guid.to_string(),
            reason,
        };

        if let Some(current) = self.guid() {
            return Err(fail(format!("already subscribed to {current}")));
        }
        if !bus.has_guid(guid) {
            return Err(fail("GUID not found".into()));
        }

        let handler: NotifyHandler = Arc::new(move |bus: &dyn WmiBus, value: u32| {
            handle_wmi_event(bus, value, &translator);
        });
        bus.install_notify_handler(guid, handler)
            .map_err(|status| fail(format!("cannot install notify handler: {status}")))?;

        tracing::info!(target: "pegatron::wmi", guid, "subscribed to WMI events");
        self.state = SubscriptionState::Subscribed {
            guid: guid.to_string(),
        };
        Ok(())
    }

    /// Removes the notify handler, if any.
    ///
    /// If the firmware refuses the removal the subscription is kept, so a later call
    /// can retry. `AE_NOT_EXIST` counts as removed: there is no handler left to track.
    pub fn unsubscribe(&mut self, bus: &dyn WmiBus) {
        let SubscriptionState::Subscribed { guid } = std::mem::take(&mut self.state) else {
            return;
        };
        match bus.remove_notify_handler(&guid) {
            Ok(()) => tracing::info!(target: "pegatron::wmi", guid = %guid, "unsubscribed from WMI events"),
            Err(AcpiStatus::AE_NOT_EXIST) => tracing::warn!(
                target: "pegatron::wmi",
                guid = %guid,
                "WMI notify handler was already gone"
            ),
            Err(status) => {
                tracing::warn!(
                    target: "pegatron::wmi",
                    guid = %guid,
                    %status,
                    "failed to remove WMI notify handler, keeping subscription"
                );
                self.state = SubscriptionState::Subscribed { guid };
            }
        }
    }
}

/// Reads the scan code carried by WMI event `value`.
///
/// `Ok(None)` means the buffer held no usable integer. The firmware buffer is
/// released before this returns on every path.
pub fn read_event_code(bus: &dyn WmiBus, value: u32) -> Result<Option<u32>> {
    let buffer = bus
        .get_event_data(value)
        .map_err(|status| DriverError::BufferAcquisition { value, status })?;

    #[cfg(feature = "debug-log")]
    tracing::trace!(target: "pegatron::wmi", value, object = ?buffer.object(), "raw WMI event");

    let code = match buffer.object() {
        Some(AcpiObject::Integer(raw)) => match u32::try_from(*raw) {
            Ok(code) => Some(code),
            Err(_) => {
                tracing::debug!(target: "pegatron::wmi", "WMI event 0x{value:x} integer 0x{raw:x} out of range");
                None
            }
        },
        Some(other) => {
            tracing::debug!(
                target: "pegatron::wmi",
                kind = other.type_name(),
                "ignoring non-integer data for WMI event 0x{value:x}"
            );
            None
        }
        None => {
            tracing::debug!(target: "pegatron::wmi", "empty buffer for WMI event 0x{value:x}");
            None
        }
    };
    Ok(code)
}

/// Notify handler body: decode, translate, and swallow any failure.
pub fn handle_wmi_event(bus: &dyn WmiBus, value: u32, translator: &Translator) -> Option<Translation> {
    match read_event_code(bus, value) {
        Ok(Some(code)) => Some(translator.translate_and_report(code)),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(target: "pegatron::wmi", "{err}");
            None
        }
    }
}
