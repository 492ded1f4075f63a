use crate::event::HotkeyEvent;
use std::collections::HashMap;

/// Receives hotkey events as the input layer reports them.
pub trait InputListener: Send {
    fn on_input(&mut self, event: &HotkeyEvent);
}

/// Which reported events a listener is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    /// Key presses and releases; sync markers are skipped.
    KeysOnly,
    Custom(fn(&HotkeyEvent) -> bool),
}

impl EventFilter {
    fn accepts(&self, event: &HotkeyEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::KeysOnly => event.kind.is_key(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// A registered listener plus its delivery settings.
struct ListenerEntry {
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
    tag: Option<String>, // device phys
}

/// Fan-out of reported hotkey events to registered listeners.
#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id used by [`enable`](Self::enable), [`disable`](Self::disable)
    /// and [`remove_listener`](Self::remove_listener). A `tag` restricts delivery to
    /// events whose `device` equals it.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        tag: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                tag,
            },
        );
        self.next_id += 1;
        id
    }

    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener; it keeps its id and settings.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `event` to every enabled listener whose tag and filter accept it.
    pub fn emit(&mut self, event: &HotkeyEvent) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }

            let tag_ok = entry.tag.as_deref().map_or(true, |t| t == event.device);
            if tag_ok && entry.filter.accepts(event) {
                entry.listener.on_input(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputKind;
    use crate::keymap::KeyCode;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<InputKind>>>);

    impl InputListener for Recorder {
        fn on_input(&mut self, event: &HotkeyEvent) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    fn press(device: &str) -> HotkeyEvent {
        HotkeyEvent::now(
            device,
            InputKind::KeyPressed {
                code: KeyCode::KEY_WLAN,
            },
        )
    }

    #[test]
    fn keys_only_filter_drops_sync_markers() {
        let mut bus = InputEventBus::new();
        let rec = Recorder::default();
        bus.add_listener(rec.clone(), EventFilter::KeysOnly, None);

        bus.emit(&press("a"));
        bus.emit(&HotkeyEvent::now("a", InputKind::Sync));

        assert_eq!(
            &*rec.0.lock().unwrap(),
            &[InputKind::KeyPressed {
                code: KeyCode::KEY_WLAN
            }]
        );
    }

    #[test]
    fn tagged_listener_only_sees_its_device() {
        let mut bus = InputEventBus::new();
        let rec = Recorder::default();
        bus.add_listener(rec.clone(), EventFilter::All, Some("wanted".into()));

        bus.emit(&press("other"));
        bus.emit(&press("wanted"));

        assert_eq!(rec.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn disabled_listener_is_muted_until_enabled() {
        let mut bus = InputEventBus::new();
        let rec = Recorder::default();
        let id = bus.add_listener(rec.clone(), EventFilter::All, None);

        bus.disable(id);
        bus.emit(&press("a"));
        assert!(rec.0.lock().unwrap().is_empty());

        bus.enable(id);
        bus.emit(&press("a"));
        assert_eq!(rec.0.lock().unwrap().len(), 1);

        bus.remove_listener(id);
        assert!(bus.is_empty());
    }

    #[test]
    fn custom_filter_selects_by_keycode() {
        let mut bus = InputEventBus::new();
        let rec = Recorder::default();
        bus.add_listener(
            rec.clone(),
            EventFilter::Custom(|ev| ev.kind.keycode() == Some(KeyCode::KEY_PROG2)),
            None,
        );

        bus.emit(&press("a"));
        bus.emit(&HotkeyEvent::now(
            "a",
            InputKind::KeyPressed {
                code: KeyCode::KEY_PROG2,
            },
        ));

        assert_eq!(
            &*rec.0.lock().unwrap(),
            &[InputKind::KeyPressed {
                code: KeyCode::KEY_PROG2
            }]
        );
    }
}
