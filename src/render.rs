use std::sync::atomic::{AtomicU64, Ordering};

use crate::page::Document;
use crate::tea::{Focus, LookupField, Notification};

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Immutable frame input handed from the logic thread to the render thread.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub version: u64,
    /// Copy of the page at snapshot time.
    pub document: Document,
    pub focus: Focus,
    pub selected: usize,
    pub lookup_field: LookupField,
    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
    /// Assistant endpoint, shown in the status line.
    pub endpoint: String,
}

impl RenderState {
    /// Clones interpolate against the clock, so frames keep changing without
    /// a new snapshot while any are on screen.
    pub fn is_moving(&self) -> bool {
        !self.document.clones.is_empty()
    }
}
