#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use pegatron_laptop::{HotkeyEvent, InputKind, InputListener};
use tracing_subscriber::EnvFilter;

pub const GUID: &str = "ABBC0F72-8EA1-11D1-00A0-C90629100000";

/// Installs a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Default)]
pub struct RecordingListener {
    pub events: Arc<Mutex<Vec<InputKind>>>,
}

impl InputListener for RecordingListener {
    fn on_input(&mut self, event: &HotkeyEvent) {
        self.events.lock().unwrap().push(event.kind);
    }
}
