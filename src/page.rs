//! The document the controllers mutate and the frontend draws.
//!
//! Every element handle is optional. A missing chat pane or lookup panel
//! turns those features into no-ops, and a missing services element makes
//! transitions fail validation instead of panicking.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use crate::content::ServiceCatalog;
use crate::markup::{escape_html, render_or_escape, MarkdownRenderer};
use crate::transition::{Bounds, Tween};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Present in layout (CSS `display`).
    pub displayed: bool,
    pub opacity: f32,
    /// Vertical nudge used by fade-in/fade-out.
    pub offset_y: f32,
    /// Accepts pointer and key activation.
    pub interactive: bool,
}

impl Style {
    pub const SHOWN: Style = Style {
        displayed: true,
        opacity: 1.0,
        offset_y: 0.0,
        interactive: true,
    };

    pub const HIDDEN: Style = Style {
        displayed: false,
        opacity: 0.0,
        offset_y: 0.0,
        interactive: false,
    };

    pub fn is_visible(&self) -> bool {
        self.displayed && self.opacity > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub style: Style,
}

impl Element {
    pub fn shown() -> Self {
        Self {
            style: Style::SHOWN,
        }
    }

    pub fn hidden() -> Self {
        Self {
            style: Style::HIDDEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub service_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServicesView {
    pub top_bar: Option<Element>,
    pub grid: Option<Element>,
    pub cards: Vec<Card>,
    pub tab_bar: Option<Element>,
    pub tabs: Vec<Tab>,
    pub info_panel: Option<Element>,
    pub info_html: String,
    pub back: Option<Element>,
}

impl ServicesView {
    /// Resting grid layout: cards visible, tabs/info/back hidden.
    pub fn from_catalog(catalog: &ServiceCatalog) -> Self {
        let mut top_bar = Element::shown();
        top_bar.style.interactive = false;
        Self {
            top_bar: Some(top_bar),
            grid: Some(Element::shown()),
            cards: catalog
                .services()
                .iter()
                .map(|s| Card {
                    service_id: s.id.clone(),
                    label: s.label.clone(),
                })
                .collect(),
            tab_bar: Some(Element::hidden()),
            tabs: catalog
                .services()
                .iter()
                .map(|s| Tab {
                    label: s.label.clone(),
                    active: false,
                })
                .collect(),
            info_panel: Some(Element::hidden()),
            info_html: String::new(),
            back: Some(Element::hidden()),
        }
    }

    /// First required handle that is absent, if any.
    pub fn missing_element(&self) -> Option<&'static str> {
        if self.grid.is_none() {
            Some("card grid")
        } else if self.top_bar.is_none() {
            Some("top bar")
        } else if self.tab_bar.is_none() {
            Some("tab bar")
        } else if self.info_panel.is_none() {
            Some("info panel")
        } else if self.back.is_none() {
            Some("back control")
        } else {
            None
        }
    }

    pub fn set_active_tab(&mut self, index: Option<usize>) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.active = Some(i) == index;
        }
    }

    pub fn active_tab(&self) -> Option<usize> {
        self.tabs.iter().position(|t| t.active)
    }

    pub fn style_mut(&mut self, which: Part) -> Option<&mut Style> {
        let element = match which {
            Part::TopBar => self.top_bar.as_mut(),
            Part::Grid => self.grid.as_mut(),
            Part::TabBar => self.tab_bar.as_mut(),
            Part::InfoPanel => self.info_panel.as_mut(),
            Part::Back => self.back.as_mut(),
        };
        element.map(|e| &mut e.style)
    }

    pub fn style(&self, which: Part) -> Option<Style> {
        let element = match which {
            Part::TopBar => self.top_bar.as_ref(),
            Part::Grid => self.grid.as_ref(),
            Part::TabBar => self.tab_bar.as_ref(),
            Part::InfoPanel => self.info_panel.as_ref(),
            Part::Back => self.back.as_ref(),
        };
        element.map(|e| e.style)
    }
}

/// Named elements of the services view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    TopBar,
    Grid,
    TabBar,
    InfoPanel,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
    Error,
}

/// One transcript turn. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub origin: Origin,
    pub content: String,
    pub rendered_as_markup: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            content: content.into(),
            rendered_as_markup: false,
        }
    }

    pub fn assistant_plain(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            content: content.into(),
            rendered_as_markup: false,
        }
    }

    pub fn assistant_markdown(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            content: content.into(),
            rendered_as_markup: true,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Error,
            content: content.into(),
            rendered_as_markup: false,
        }
    }

    /// HTML fragment for this message. Only markup-flagged assistant text
    /// goes through the renderer; everything else is escaped.
    pub fn to_html(&self, renderer: Option<&dyn MarkdownRenderer>) -> String {
        match (self.origin, self.rendered_as_markup) {
            (Origin::Error, _) => format!("⚠ {}", escape_html(&self.content)),
            (Origin::Assistant, true) => render_or_escape(renderer, &self.content),
            _ => escape_html(&self.content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub message: Message,
    pub html: String,
}

/// Append-only list of turns plus one typing indicator, shown while any
/// reply is pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    nodes: Vec<MessageNode>,
    pending: usize,
}

impl Transcript {
    pub fn append(&mut self, message: Message, renderer: Option<&dyn MarkdownRenderer>) {
        let html = message.to_html(renderer);
        self.nodes.push(MessageNode { message, html });
    }

    /// Register a pending reply. Returns true when this made the indicator
    /// appear.
    pub fn show_typing(&mut self) -> bool {
        self.pending += 1;
        self.pending == 1
    }

    /// Settle one pending reply. Returns true when the indicator went away.
    pub fn hide_typing(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        self.pending == 0
    }

    pub fn is_typing(&self) -> bool {
        self.pending > 0
    }

    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    pub fn last(&self) -> Option<&MessageNode> {
        self.nodes.last()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPane {
    pub transcript: Transcript,
    pub input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LookupOutput {
    #[default]
    Hidden,
    Loading,
    Ready(String),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupPanel {
    pub language: String,
    pub app: String,
    pub problem: String,
    pub output: LookupOutput,
}

/// Visual stand-in for a card or tab while the layout changes underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneNode {
    pub label: String,
    pub bounds: Bounds,
    pub radius: f32,
    pub opacity: f32,
    /// Set once the clone starts moving.
    pub tween: Option<Tween>,
}

impl CloneNode {
    pub fn at(label: impl Into<String>, bounds: Bounds, radius: f32) -> Self {
        Self {
            label: label.into(),
            bounds,
            radius,
            opacity: 1.0,
            tween: None,
        }
    }

    pub fn bounds_at(&self, now: Instant) -> Bounds {
        self.tween
            .map(|t| t.bounds_at(now))
            .unwrap_or(self.bounds)
    }

    pub fn radius_at(&self, now: Instant) -> f32 {
        self.tween.map(|t| t.radius_at(now)).unwrap_or(self.radius)
    }
}

/// A notice that blocks input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    version: u64,
    pub chat: Option<ChatPane>,
    pub lookup: Option<LookupPanel>,
    pub services: Option<ServicesView>,
    pub clones: Vec<CloneNode>,
    pub notice: Option<Notice>,
}

impl Document {
    /// Every element present, services in resting grid layout.
    pub fn new(catalog: &ServiceCatalog) -> Self {
        Self {
            version: 0,
            chat: Some(ChatPane::default()),
            lookup: Some(LookupPanel::default()),
            services: Some(ServicesView::from_catalog(catalog)),
            clones: Vec::new(),
            notice: None,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn services_style(&self, part: Part) -> Option<Style> {
        self.services.as_ref().and_then(|s| s.style(part))
    }

    /// Mutate a services element if it exists.
    pub fn restyle(&mut self, part: Part, f: impl FnOnce(&mut Style)) {
        if let Some(style) = self.services.as_mut().and_then(|s| s.style_mut(part)) {
            f(style);
        }
    }
}

/// Shared handle to the document. Mutations are serialized by the lock and
/// bump the document version.
#[derive(Debug, Clone, Default)]
pub struct Page {
    inner: Arc<Mutex<Document>>,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(Mutex::new(document)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut doc = self.lock();
        let result = f(&mut doc);
        doc.version = doc.version.wrapping_add(1);
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> Document {
        self.lock().clone()
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }
}
