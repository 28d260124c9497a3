//! Terminal geometry shared by the renderer and the transition controller.
//!
//! The controller measures card and tab rectangles through [`TerminalLayout`],
//! and `ui` draws with the same functions, so clones land exactly where the
//! real widgets appear.

use std::sync::Mutex;

use ratatui::layout::{Constraint, Layout as Split, Margin, Rect};

use crate::transition::{Bounds, Layout};

pub const CARD_WIDTH: u16 = 18;
pub const CARD_HEIGHT: u16 = 5;
pub const CARD_GAP: u16 = 2;
pub const TAB_HEIGHT: u16 = 3;

const LOOKUP_HEIGHT: u16 = 10;

/// Top-level screen areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub top_bar: Rect,
    pub services: Rect,
    pub chat: Rect,
    pub lookup: Rect,
    pub status: Rect,
}

pub fn screen_regions(area: Rect) -> Regions {
    let rows = Split::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let columns = Split::horizontal([Constraint::Percentage(58), Constraint::Fill(1)]).split(rows[1]);

    let lookup_height = LOOKUP_HEIGHT.min(columns[1].height / 2);
    let right = Split::vertical([Constraint::Fill(1), Constraint::Length(lookup_height)])
        .split(columns[1]);

    Regions {
        top_bar: rows[0],
        services: columns[0],
        chat: right[0],
        lookup: right[1],
        status: rows[2],
    }
}

/// Inside of a bordered pane.
pub fn pane_inner(area: Rect) -> Rect {
    area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    })
}

/// Card rectangles, filled left to right then top to bottom. Cells past the
/// bottom of `area` are still reported so measurement stays index-aligned.
pub fn card_cells(area: Rect, count: usize) -> Vec<Rect> {
    let columns = ((area.width + CARD_GAP) / (CARD_WIDTH + CARD_GAP)).max(1);
    let width = CARD_WIDTH.min(area.width.max(1));
    (0..count)
        .map(|i| {
            let i = u16::try_from(i).unwrap_or(u16::MAX);
            let col = i % columns;
            let row = i / columns;
            Rect::new(
                area.x.saturating_add(col.saturating_mul(CARD_WIDTH + CARD_GAP)),
                area.y.saturating_add(row.saturating_mul(CARD_HEIGHT + 1)),
                width,
                CARD_HEIGHT,
            )
        })
        .collect()
}

/// Tab rectangles sized to their labels, wrapping onto further rows.
pub fn tab_cells(area: Rect, labels: &[String]) -> Vec<Rect> {
    let mut cells = Vec::with_capacity(labels.len());
    let (mut x, mut y) = (area.x, area.y);
    for label in labels {
        let label_width = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
        let width = label_width.saturating_add(4).min(area.width.max(1));
        if x > area.x && x.saturating_add(width) > area.right() {
            x = area.x;
            y = y.saturating_add(TAB_HEIGHT);
        }
        cells.push(Rect::new(x, y, width, TAB_HEIGHT));
        x = x.saturating_add(width + 1);
    }
    cells
}

/// Rows taken by the tab bar.
pub fn tab_bar_height(area: Rect, labels: &[String]) -> u16 {
    tab_cells(area, labels)
        .iter()
        .map(|c| c.bottom().saturating_sub(area.y))
        .max()
        .unwrap_or(0)
}

pub fn to_bounds(cell: Rect) -> Bounds {
    Bounds::new(
        f32::from(cell.x),
        f32::from(cell.y),
        f32::from(cell.width),
        f32::from(cell.height),
    )
}

/// Nearest cell for `bounds`, clipped to `clip`.
pub fn to_cell(bounds: Bounds, clip: Rect) -> Rect {
    let snap = |v: f32| v.round().clamp(0.0, f32::from(u16::MAX)) as u16;
    Rect::new(
        snap(bounds.left),
        snap(bounds.top),
        snap(bounds.width).max(1),
        snap(bounds.height).max(1),
    )
    .intersection(clip)
}

/// Measures cards and tabs for the current terminal size.
#[derive(Debug)]
pub struct TerminalLayout {
    size: Mutex<(u16, u16)>,
    labels: Vec<String>,
}

impl TerminalLayout {
    pub fn new(width: u16, height: u16, labels: Vec<String>) -> Self {
        Self {
            size: Mutex::new((width, height)),
            labels,
        }
    }

    pub fn set_size(&self, width: u16, height: u16) {
        *self.size.lock().unwrap_or_else(|e| e.into_inner()) = (width, height);
    }

    fn services_inner(&self) -> Rect {
        let (width, height) = *self.size.lock().unwrap_or_else(|e| e.into_inner());
        pane_inner(screen_regions(Rect::new(0, 0, width, height)).services)
    }
}

impl Layout for TerminalLayout {
    fn card_bounds(&self) -> Vec<Bounds> {
        card_cells(self.services_inner(), self.labels.len())
            .into_iter()
            .map(to_bounds)
            .collect()
    }

    fn tab_bounds(&self) -> Vec<Bounds> {
        tab_cells(self.services_inner(), &self.labels)
            .into_iter()
            .map(to_bounds)
            .collect()
    }
}
