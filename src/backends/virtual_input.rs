//! In-memory platform backends.
//!
//! Stand-ins for the ACPI namespace, the WMI event channel and the input layer.
//! Each type is a cheap handle over shared state: clone it before handing it to the
//! driver and keep the clone to inject firmware behavior and inspect what happened.

use crate::error::InputError;
use crate::event::{HotkeyEvent, InputKind};
use crate::eventbus::{EventFilter, InputEventBus, InputListener};
use crate::firmware::{AcpiDevice, AcpiObject, AcpiStatus, EventBuffer, NotifyHandler, WmiBus};
use crate::input::{InputBackend, InputDevice};
use crate::keymap::{KeyCode, Keymap};
use crate::lock;
use crate::metadata::InputDeviceMeta;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// ACPI
// ---------------------------------------------------------------------------

/// One recorded `execute_simple_method` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub arg: u32,
}

#[derive(Default)]
struct AcpiState {
    methods: HashMap<String, AcpiStatus>,
    calls: Vec<MethodCall>,
}

/// ACPI device node with a configurable method table.
#[derive(Clone)]
pub struct VirtualAcpiDevice {
    hid: String,
    uid: String,
    state: Arc<Mutex<AcpiState>>,
}

impl VirtualAcpiDevice {
    /// A node with no methods.
    pub fn new(hid: &str, uid: &str) -> Self {
        Self {
            hid: hid.to_string(),
            uid: uid.to_string(),
            state: Arc::default(),
        }
    }

    /// `PTK0001:00` with a working `INIT` method.
    pub fn pegatron() -> Self {
        Self::new("PTK0001", "PTK0001:00").with_method("INIT", AcpiStatus::AE_OK)
    }

    /// Adds (or replaces) a method that returns `status` when evaluated.
    pub fn with_method(self, name: &str, status: AcpiStatus) -> Self {
        lock(&self.state).methods.insert(name.to_string(), status);
        self
    }

    pub fn without_method(self, name: &str) -> Self {
        lock(&self.state).methods.remove(name);
        self
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }
}

impl AcpiDevice for VirtualAcpiDevice {
    fn hardware_id(&self) -> &str {
        &self.hid
    }

    fn unique_id(&self) -> &str {
        &self.uid
    }

    fn has_method(&self, name: &str) -> bool {
        lock(&self.state).methods.contains_key(name)
    }

    fn execute_simple_method(&self, name: &str, arg: u32) -> Result<(), AcpiStatus> {
        let mut state = lock(&self.state);
        state.calls.push(MethodCall {
            method: name.to_string(),
            arg,
        });
        match state.methods.get(name) {
            Some(status) => status.into_result(),
            None => Err(AcpiStatus::AE_NOT_FOUND),
        }
    }
}

// ---------------------------------------------------------------------------
// WMI
// ---------------------------------------------------------------------------

#[derive(Default)]
struct WmiState {
    guids: Mutex<HashSet<String>>,
    handlers: Mutex<HashMap<String, NotifyHandler>>,
    remove_failure: Mutex<Option<AcpiStatus>>,
    event_data: Mutex<HashMap<u32, Result<Option<AcpiObject>, AcpiStatus>>>,
    outstanding: AtomicUsize,
    acquired: AtomicUsize,
}

/// WMI event channel with scripted event data.
#[derive(Clone, Default)]
pub struct VirtualWmiBus {
    state: Arc<WmiState>,
}

impl VirtualWmiBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `guid` known to the firmware.
    pub fn with_guid(self, guid: &str) -> Self {
        lock(&self.state.guids).insert(guid.to_string());
        self
    }

    /// Object returned by `get_event_data(value)`. `None` models an empty buffer.
    pub fn set_event_object(&self, value: u32, object: Option<AcpiObject>) {
        lock(&self.state.event_data).insert(value, Ok(object));
    }

    /// Makes `get_event_data(value)` fail with `status`.
    pub fn fail_event_data(&self, value: u32, status: AcpiStatus) {
        lock(&self.state.event_data).insert(value, Err(status));
    }

    /// Makes every following `remove_notify_handler` fail with `status` and leave
    /// the handler installed. `None` clears it.
    pub fn fail_remove(&self, status: Option<AcpiStatus>) {
        *lock(&self.state.remove_failure) = status;
    }

    /// Delivers a notification to the handler installed for `guid`.
    ///
    /// Returns `false` if no handler is installed.
    pub fn fire(&self, guid: &str, value: u32) -> bool {
        // Clone the handler out so it can call back into the bus unlocked.
        let handler = lock(&self.state.handlers).get(guid).cloned();
        match handler {
            Some(handler) => {
                handler(self, value);
                true
            }
            None => false,
        }
    }

    /// Shorthand: the event `value` carries integer `code`, then fire it.
    pub fn fire_integer(&self, guid: &str, value: u32, code: u64) -> bool {
        self.set_event_object(value, Some(AcpiObject::Integer(code)));
        self.fire(guid, value)
    }

    pub fn has_handler(&self, guid: &str) -> bool {
        lock(&self.state.handlers).contains_key(guid)
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.state.handlers).len()
    }

    /// Buffers handed out and not yet released.
    pub fn outstanding_buffers(&self) -> usize {
        self.state.outstanding.load(Ordering::SeqCst)
    }

    /// Total successful `get_event_data` calls.
    pub fn buffers_acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }
}

impl WmiBus for VirtualWmiBus {
    fn has_guid(&self, guid: &str) -> bool {
        lock(&self.state.guids).contains(guid)
    }

    fn install_notify_handler(&self, guid: &str, handler: NotifyHandler) -> Result<(), AcpiStatus> {
        if !self.has_guid(guid) {
            return Err(AcpiStatus::AE_NOT_EXIST);
        }
        let mut handlers = lock(&self.state.handlers);
        if handlers.contains_key(guid) {
            return Err(AcpiStatus::AE_ALREADY_EXISTS);
        }
        handlers.insert(guid.to_string(), handler);
        Ok(())
    }

    fn remove_notify_handler(&self, guid: &str) -> Result<(), AcpiStatus> {
        if let Some(status) = *lock(&self.state.remove_failure) {
            return Err(status);
        }
        match lock(&self.state.handlers).remove(guid) {
            Some(_) => Ok(()),
            None => Err(AcpiStatus::AE_NOT_EXIST),
        }
    }

    fn get_event_data(&self, value: u32) -> Result<EventBuffer<'_>, AcpiStatus> {
        let object = lock(&self.state.event_data)
            .get(&value)
            .cloned()
            .unwrap_or(Err(AcpiStatus::AE_NOT_FOUND))?;

        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        self.state.outstanding.fetch_add(1, Ordering::SeqCst);
        let outstanding = &self.state.outstanding;
        Ok(EventBuffer::with_release(object, move || {
            outstanding.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which step of input device setup a [`VirtualInputBackend`] should fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailAt {
    Allocation,
    Keymap,
    Registration,
}

#[derive(Default)]
struct InputState {
    bus: Mutex<InputEventBus>,
    history: Mutex<Vec<HotkeyEvent>>,
    fail: Mutex<Option<FailAt>>,
    allocations: AtomicUsize,
    live: AtomicUsize,
    registered: AtomicUsize,
}

/// Input layer that records every reported event and fans it out to listeners.
#[derive(Clone, Default)]
pub struct VirtualInputBackend {
    state: Arc<InputState>,
}

impl VirtualInputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following setup fail at `step`. `None` clears it.
    pub fn fail_at(&self, step: Option<FailAt>) {
        *lock(&self.state.fail) = step;
    }

    pub fn add_listener(
        &self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        tag: Option<String>,
    ) -> u64 {
        lock(&self.state.bus).add_listener(listener, filter, tag)
    }

    /// Every event reported so far, sync markers included.
    pub fn events(&self) -> Vec<HotkeyEvent> {
        lock(&self.state.history).clone()
    }

    /// Key events only, in report order.
    pub fn key_events(&self) -> Vec<InputKind> {
        lock(&self.state.history)
            .iter()
            .map(|e| e.kind)
            .filter(InputKind::is_key)
            .collect()
    }

    /// Total `allocate` calls that succeeded.
    pub fn allocations(&self) -> usize {
        self.state.allocations.load(Ordering::SeqCst)
    }

    /// Devices allocated and not yet freed.
    pub fn live_devices(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    pub fn registered_devices(&self) -> usize {
        self.state.registered.load(Ordering::SeqCst)
    }

    fn failing(&self, step: FailAt) -> bool {
        *lock(&self.state.fail) == Some(step)
    }
}

impl InputBackend for VirtualInputBackend {
    fn allocate(&self, meta: &InputDeviceMeta) -> Result<Box<dyn InputDevice>, InputError> {
        if self.failing(FailAt::Allocation) {
            return Err(InputError::Allocation);
        }
        self.state.allocations.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(VirtualInputDevice {
            meta: meta.clone(),
            keymap: None,
            registered: false,
            backend: self.clone(),
        }))
    }
}

/// One device allocated by [`VirtualInputBackend`].
pub struct VirtualInputDevice {
    meta: InputDeviceMeta,
    keymap: Option<Keymap>,
    registered: bool,
    backend: VirtualInputBackend,
}

impl VirtualInputDevice {
    fn feed(&mut self, kind: InputKind) {
        let event = HotkeyEvent::now(self.meta.phys.clone(), kind);
        lock(&self.backend.state.bus).emit(&event);
        lock(&self.backend.state.history).push(event);
    }
}

impl InputDevice for VirtualInputDevice {
    fn setup_keymap(&mut self, keymap: &Keymap) -> Result<(), InputError> {
        if self.backend.failing(FailAt::Keymap) {
            return Err(InputError::Keymap("injected failure".into()));
        }
        self.keymap = Some(keymap.clone());
        Ok(())
    }

    fn register(&mut self) -> Result<(), InputError> {
        if self.backend.failing(FailAt::Registration) {
            return Err(InputError::Registration("injected failure".into()));
        }
        if !self.registered {
            self.registered = true;
            self.backend.state.registered.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn report_key(&mut self, code: KeyCode, pressed: bool) {
        // The input core drops keys the device never declared.
        let declared = self
            .keymap
            .as_ref()
            .is_some_and(|km| km.contains_keycode(code));
        if !self.registered || !declared {
            return;
        }
        let kind = if pressed {
            InputKind::KeyPressed { code }
        } else {
            InputKind::KeyReleased { code }
        };
        self.feed(kind);
    }

    fn sync(&mut self) {
        if self.registered {
            self.feed(InputKind::Sync);
        }
    }

    fn unregister(&mut self) {
        if self.registered {
            self.registered = false;
            self.backend.state.registered.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for VirtualInputDevice {
    fn drop(&mut self) {
        self.backend.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}
