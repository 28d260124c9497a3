//! Model for the TEA (The Elm Architecture) pattern.
//!
//! UI-local state lives here. Everything the controllers also touch (chat
//! input, transcript, lookup fields, services view) lives in the shared
//! [`Page`] so both sides see one source of truth.

use std::sync::Arc;

use crate::chat::{DEFAULT_APP, DEFAULT_LANGUAGE};
use crate::config::Config;
use crate::content::ServiceCatalog;
use crate::page::Page;
use crate::render::{next_version, RenderState};

/// Level of a status-line notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Services,
    Chat,
    Lookup,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Services => Focus::Chat,
            Focus::Chat => Focus::Lookup,
            Focus::Lookup => Focus::Services,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Services => Focus::Lookup,
            Focus::Chat => Focus::Services,
            Focus::Lookup => Focus::Chat,
        }
    }
}

/// Field of the lookup form under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupField {
    #[default]
    Language,
    App,
    Problem,
}

impl LookupField {
    pub fn next(self) -> Self {
        match self {
            LookupField::Language => LookupField::App,
            LookupField::App => LookupField::Problem,
            LookupField::Problem => LookupField::Language,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LookupField::Language => LookupField::Problem,
            LookupField::App => LookupField::Language,
            LookupField::Problem => LookupField::App,
        }
    }
}

pub struct Model {
    pub page: Page,
    pub catalog: Arc<ServiceCatalog>,

    pub focus: Focus,
    /// Card (or tab) under the cursor.
    pub selected: usize,
    pub lookup_field: LookupField,

    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,

    // Dirty flag - set when state changes and render is needed
    pub dirty: bool,

    pub config: Config,
}

impl Model {
    pub fn new(page: Page, catalog: Arc<ServiceCatalog>, config: Config) -> Self {
        let app = catalog
            .services()
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(DEFAULT_APP))
            .or_else(|| catalog.at(0))
            .map(|s| s.label.clone())
            .unwrap_or_else(|| DEFAULT_APP.to_string());
        page.with(|doc| {
            if let Some(lookup) = doc.lookup.as_mut() {
                if lookup.language.is_empty() {
                    lookup.language = DEFAULT_LANGUAGE.to_string();
                }
                if lookup.app.is_empty() {
                    lookup.app = app;
                }
            }
        });

        Self {
            page,
            catalog,
            focus: Focus::default(),
            selected: 0,
            lookup_field: LookupField::default(),
            notification: None,
            show_keymap: false,
            dirty: true,
            config,
        }
    }

    pub fn service_count(&self) -> usize {
        self.catalog.len()
    }

    /// Create an immutable snapshot for the render thread.
    pub fn snapshot(&self) -> RenderState {
        RenderState {
            version: next_version(),
            document: self.page.snapshot(),
            focus: self.focus,
            selected: self.selected,
            lookup_field: self.lookup_field,
            notification: self.notification.clone(),
            show_keymap: self.show_keymap,
            endpoint: self.config.effective_endpoint().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Document;

    fn model() -> Model {
        let catalog = Arc::new(ServiceCatalog::builtin());
        let page = Page::new(Document::new(&catalog));
        Model::new(page, catalog, Config::default())
    }

    #[test]
    fn test_new_fills_lookup_defaults() {
        let model = model();
        model.page.read(|doc| {
            let lookup = doc.lookup.as_ref().unwrap();
            assert_eq!(lookup.language, "english");
            assert_eq!(lookup.app, "UMANG");
        });
        assert_eq!(model.focus, Focus::Services);
        assert!(model.dirty);
    }

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Services.next().next().next(), Focus::Services);
        assert_eq!(Focus::Services.prev(), Focus::Lookup);
        assert_eq!(LookupField::Language.prev(), LookupField::Problem);
        assert_eq!(LookupField::Problem.next(), LookupField::Language);
    }

    #[test]
    fn test_snapshot_copies_document() {
        let model = model();
        model.page.with(|doc| doc.chat.as_mut().unwrap().input = "hi".to_string());
        let first = model.snapshot();
        let second = model.snapshot();
        assert!(second.version > first.version);
        assert_eq!(first.document.chat.unwrap().input, "hi");
    }
}
