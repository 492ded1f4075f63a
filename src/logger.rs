use crate::event::{HotkeyEvent, InputKind};
use crate::eventbus::InputListener;

/// A listener that logs every hotkey event through `tracing`.
#[derive(Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }
}

impl InputListener for Logger {
    fn on_input(&mut self, event: &HotkeyEvent) {
        match event.kind {
            InputKind::KeyPressed { code } => {
                tracing::info!(target: "pegatron::input", device = %event.device, key = %code, "key pressed")
            }
            InputKind::KeyReleased { code } => {
                tracing::info!(target: "pegatron::input", device = %event.device, key = %code, "key released")
            }
            InputKind::Sync => tracing::trace!(target: "pegatron::input", device = %event.device, "sync"),
        }
    }
}
