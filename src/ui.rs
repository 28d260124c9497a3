//! Terminal UI rendering for govdesk.
//!
//! Screen layout (see [`crate::layout`]):
//! - Top bar: title, and the back control once a service is open
//! - Services pane: card grid or tab bar plus detail panel, with transition
//!   clones drawn on top while a handoff is in flight
//! - Assistant pane: transcript and input box
//! - Info lookup panel: language/app pickers, problem text, output
//! - Status line: keymap legend and endpoint
//!
//! This module renders from RenderState (immutable snapshot) - it never
//! mutates application state.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tokio::time::Instant;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::layout::{
    card_cells, pane_inner, screen_regions, tab_bar_height, tab_cells, to_cell,
};
use crate::markup::{text_lines, LineKind};
use crate::page::{
    ChatPane, CloneNode, Document, LookupOutput, LookupPanel, Origin, ServicesView,
    Style as ElementStyle,
};
use crate::render::RenderState;
use crate::tea::{Focus, LookupField, Notification, NotificationLevel};

// Color tokens (selection uses REVERSED modifier to adapt to terminal theme)
const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_ACCENT: Color = Color::Cyan;
const COLOR_USER: Color = Color::Yellow;
const COLOR_ERROR: Color = Color::Red;

/// Clones with a radius above this draw with rounded corners.
const ROUNDED_RADIUS: f32 = 20.0;

// -----------------------------------------------------------------------------
// Context-sensitive keymap
// -----------------------------------------------------------------------------

/// A single keybinding entry for display.
struct Keybinding(&'static str, &'static str);

/// A group of related keybindings (separated by │).
struct KeybindingGroup(Vec<Keybinding>);

fn keybindings_for(focus: Focus, notice_open: bool) -> Vec<KeybindingGroup> {
    if notice_open {
        return vec![KeybindingGroup(vec![Keybinding("Enter", "dismiss")])];
    }
    let focus_group = match focus {
        Focus::Services => vec![
            Keybinding("←→", "select"),
            Keybinding("Enter", "open"),
            Keybinding("b", "back"),
        ],
        Focus::Chat => vec![
            Keybinding("Enter", "send"),
            Keybinding("F2", "dictate"),
            Keybinding("^N", "new chat"),
        ],
        Focus::Lookup => vec![
            Keybinding("↑↓", "field"),
            Keybinding("←→", "choose"),
            Keybinding("Enter", "look up"),
            Keybinding("Esc", "clear"),
        ],
    };
    vec![
        KeybindingGroup(focus_group),
        KeybindingGroup(vec![Keybinding("Tab", "focus")]),
        KeybindingGroup(vec![Keybinding("^C", "quit")]),
    ]
}

/// Main render function - entry point for all UI drawing.
/// Takes an immutable RenderState snapshot.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    let regions = screen_regions(frame.area());
    let doc = &state.document;
    let now = Instant::now();

    render_top_bar(frame, doc, regions.top_bar);
    render_services(frame, state, regions.services, now);
    render_chat(frame, state, regions.chat);
    render_lookup(frame, state, regions.lookup);
    render_statusbar(frame, state, regions.status);

    if let Some(ref notification) = state.notification {
        render_notification(frame, notification, regions.status);
    }
    if let Some(ref notice) = doc.notice {
        render_notice(frame, &notice.message, frame.area());
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(COLOR_ACCENT)
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", title))
}

/// Faded elements draw muted; fully transparent ones are skipped by callers.
fn faded(style: Style, element: ElementStyle) -> Style {
    if element.opacity < 1.0 {
        style.fg(COLOR_TEXT_MUTED)
    } else {
        style
    }
}

fn render_top_bar(frame: &mut Frame, doc: &Document, area: Rect) {
    let mut spans = vec![Span::styled(
        " govdesk ",
        Style::default().add_modifier(Modifier::BOLD),
    )];

    let top = doc.services.as_ref().and_then(|s| s.top_bar.as_ref());
    let back = doc.services.as_ref().and_then(|s| s.back.as_ref());
    if let Some(back) = back.filter(|b| b.style.is_visible()) {
        let interactive = back.style.interactive && top.is_some_and(|t| t.style.interactive);
        let style = if interactive {
            Style::default().fg(COLOR_ACCENT)
        } else {
            Style::default().fg(COLOR_TEXT_MUTED)
        };
        spans.push(Span::styled("[← Back]", style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_services(frame: &mut Frame, state: &RenderState, area: Rect, now: Instant) {
    let focused = state.focus == Focus::Services;
    frame.render_widget(pane_block("Services", focused), area);
    let inner = pane_inner(area);

    let Some(view) = state.document.services.as_ref() else {
        let text = Paragraph::new("Services unavailable").style(Style::default().fg(COLOR_TEXT_MUTED));
        frame.render_widget(text, inner);
        return;
    };

    if let Some(grid) = view.grid.as_ref().filter(|g| g.style.is_visible()) {
        render_cards(frame, view, grid.style, state.selected, focused, inner);
    }

    if let Some(tab_bar) = view.tab_bar.as_ref().filter(|t| t.style.is_visible()) {
        render_tabs(frame, view, tab_bar.style, state.selected, focused, inner);
    }

    if let Some(panel) = view.info_panel.as_ref().filter(|p| p.style.displayed) {
        let labels: Vec<String> = view.tabs.iter().map(|t| t.label.clone()).collect();
        let top = tab_bar_height(inner, &labels) + 1 + u16::from(panel.style.offset_y > 0.0);
        let info_area = Rect {
            y: inner.y.saturating_add(top),
            height: inner.height.saturating_sub(top),
            ..inner
        };
        if panel.style.opacity > 0.0 && info_area.height > 0 {
            render_info(frame, &view.info_html, panel.style, info_area);
        }
    }

    for clone in &state.document.clones {
        render_clone(frame, clone, area, now);
    }
}

fn render_cards(
    frame: &mut Frame,
    view: &ServicesView,
    grid: ElementStyle,
    selected: usize,
    focused: bool,
    area: Rect,
) {
    let cells = card_cells(area, view.cards.len());
    for (i, (card, cell)) in view.cards.iter().zip(cells).enumerate() {
        let cell = cell.intersection(area);
        if cell.height < 3 {
            continue;
        }
        let is_selected = focused && i == selected;
        let border_type = if is_selected {
            BorderType::Thick
        } else {
            BorderType::Rounded
        };
        let style = faded(Style::default(), grid);
        let label_style = if is_selected {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(style);
        let paragraph = Paragraph::new(Line::from(Span::styled(card.label.clone(), label_style)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, cell);
    }
}

fn render_tabs(
    frame: &mut Frame,
    view: &ServicesView,
    tab_bar: ElementStyle,
    selected: usize,
    focused: bool,
    area: Rect,
) {
    let labels: Vec<String> = view.tabs.iter().map(|t| t.label.clone()).collect();
    let cells = tab_cells(area, &labels);
    for (i, (tab, cell)) in view.tabs.iter().zip(cells).enumerate() {
        let cell = cell.intersection(area);
        if cell.height < 3 {
            continue;
        }
        let mut style = faded(Style::default(), tab_bar);
        if tab.active {
            style = style.fg(COLOR_ACCENT).add_modifier(Modifier::BOLD);
        }
        let label_style = if focused && i == selected && tab_bar.interactive {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(style);
        let paragraph = Paragraph::new(Line::from(Span::styled(tab.label.clone(), label_style)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, cell);
    }
}

/// Styled ratatui lines for an HTML fragment.
fn fragment_lines(fragment: &str, base: Style) -> Vec<Line<'static>> {
    text_lines(fragment)
        .into_iter()
        .map(|line| {
            let style = match line.kind {
                LineKind::Heading => base.add_modifier(Modifier::BOLD),
                LineKind::Code => base.fg(COLOR_TEXT_DIMMED),
                _ => base,
            };
            Line::from(Span::styled(line.text, style))
        })
        .collect()
}

fn render_info(frame: &mut Frame, html: &str, panel: ElementStyle, area: Rect) {
    let lines = fragment_lines(html, faded(Style::default(), panel));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_clone(frame: &mut Frame, clone: &CloneNode, clip: Rect, now: Instant) {
    if clone.opacity <= 0.0 {
        return;
    }
    let cell = to_cell(clone.bounds_at(now), clip);
    if cell.width < 2 || cell.height < 2 {
        return;
    }
    let border_type = if clone.radius_at(now) > ROUNDED_RADIUS {
        BorderType::Rounded
    } else {
        BorderType::Plain
    };
    let style = if clone.opacity < 1.0 {
        Style::default().fg(COLOR_TEXT_MUTED)
    } else {
        Style::default().fg(COLOR_ACCENT)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(style);
    frame.render_widget(Clear, cell);
    frame.render_widget(
        Paragraph::new(clone.label.clone())
            .alignment(Alignment::Center)
            .style(style)
            .block(block),
        cell,
    );
}

fn render_chat(frame: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.focus == Focus::Chat;
    frame.render_widget(pane_block("Assistant", focused), area);
    let inner = pane_inner(area);

    let Some(chat) = state.document.chat.as_ref() else {
        let text = Paragraph::new("Chat unavailable").style(Style::default().fg(COLOR_TEXT_MUTED));
        frame.render_widget(text, inner);
        return;
    };

    let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(inner);
    render_transcript(frame, chat, chunks[0]);

    let prompt_style = if focused {
        Style::default().fg(COLOR_ACCENT)
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans = vec![
        Span::styled("› ", prompt_style),
        Span::raw(chat.input.clone()),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(COLOR_TEXT_DIMMED)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
}

/// Transcript lines, wrapped to `width`.
fn transcript_lines(chat: &ChatPane, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for node in chat.transcript.nodes() {
        let (label, base) = match node.message.origin {
            Origin::User => ("You", Style::default().fg(COLOR_USER)),
            Origin::Assistant => ("Assistant", Style::default()),
            Origin::Error => ("", Style::default().fg(COLOR_ERROR)),
        };
        if !label.is_empty() {
            lines.push(Line::from(Span::styled(
                label,
                base.add_modifier(Modifier::BOLD),
            )));
        }
        for line in fragment_lines(&node.html, base) {
            let style = line.spans.first().map(|s| s.style).unwrap_or(base);
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            for piece in wrap(&text, width) {
                lines.push(Line::from(Span::styled(piece, style)));
            }
        }
        lines.push(Line::default());
    }
    if chat.transcript.is_typing() {
        lines.push(Line::from(Span::styled(
            "Assistant is typing…",
            Style::default()
                .fg(COLOR_TEXT_MUTED)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn render_transcript(frame: &mut Frame, chat: &ChatPane, area: Rect) {
    let lines = transcript_lines(chat, area.width);
    // Follow the tail
    let start = lines.len().saturating_sub(area.height as usize);
    let visible: Vec<Line> = lines.into_iter().skip(start).collect();
    frame.render_widget(Paragraph::new(visible), area);
}

/// Greedy word wrap on display width. Words wider than `width` are split.
fn wrap(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in text.split(' ') {
        let mut word = word;
        while word.width() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            let (head, rest) = split_at_width(word, width);
            out.push(head.to_string());
            word = rest;
        }
        let word_width = word.width();
        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + 1 + word_width
        };
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Longest prefix that fits in `width` columns. Always takes at least one
/// char.
fn split_at_width(word: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, c) in word.char_indices() {
        let w = c.width().unwrap_or(0);
        if idx > 0 && used + w > width {
            return word.split_at(idx);
        }
        used += w;
    }
    (word, "")
}

fn render_lookup(frame: &mut Frame, state: &RenderState, area: Rect) {
    if area.height < 3 {
        return;
    }
    let focused = state.focus == Focus::Lookup;
    frame.render_widget(pane_block("Info lookup", focused), area);
    let inner = pane_inner(area);

    let Some(panel) = state.document.lookup.as_ref() else {
        let text = Paragraph::new("Lookup unavailable").style(Style::default().fg(COLOR_TEXT_MUTED));
        frame.render_widget(text, inner);
        return;
    };

    let mut lines = lookup_form(panel, focused.then_some(state.lookup_field));
    match &panel.output {
        LookupOutput::Hidden => {}
        LookupOutput::Loading => lines.push(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(COLOR_TEXT_MUTED),
        ))),
        LookupOutput::Ready(html) => lines.extend(fragment_lines(html, Style::default())),
        LookupOutput::Failed(html) => {
            lines.extend(fragment_lines(html, Style::default().fg(COLOR_ERROR)))
        }
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn lookup_form(panel: &LookupPanel, active: Option<LookupField>) -> Vec<Line<'static>> {
    let field = |name: &'static str, value: String, which: LookupField, picker: bool| {
        let is_active = active == Some(which);
        let value_style = if is_active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        let value = if picker {
            format!("‹ {} ›", value)
        } else {
            value
        };
        Line::from(vec![
            Span::styled(format!("{:<9}", name), Style::default().fg(COLOR_TEXT_DIMMED)),
            Span::styled(value, value_style),
        ])
    };
    vec![
        field("Language", panel.language.clone(), LookupField::Language, true),
        field("App", panel.app.clone(), LookupField::App, true),
        field("Problem", panel.problem.clone(), LookupField::Problem, false),
        Line::default(),
    ]
}

/// Keymap legend on the left, endpoint on the right.
/// When show_keymap is false: Shows just "?" (grayed out)
/// When show_keymap is true: Shows "? │ <full keymap legend>" with bright "?"
fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    let line = render_keymap_line(state, area.width);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_keymap_line(state: &RenderState, width: u16) -> Line<'static> {
    let groups = keybindings_for(state.focus, state.document.notice.is_some());

    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let sep_style = Style::default().fg(COLOR_TEXT_MUTED);

    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans: Vec<Span> = vec![Span::styled("?", help_style)];

    if state.show_keymap {
        for group in groups.iter() {
            spans.push(Span::styled(" │ ", sep_style));
            for (key_idx, keybinding) in group.0.iter().enumerate() {
                if key_idx > 0 {
                    spans.push(Span::styled(" • ", sep_style));
                }
                spans.push(Span::styled(keybinding.0, key_style));
                spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
            }
        }
    }

    let endpoint = format!(" {} ", state.endpoint);
    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let spacer_width = (width as usize)
        .saturating_sub(content_width)
        .saturating_sub(endpoint.chars().count());
    if spacer_width > 0 {
        spans.push(Span::raw(" ".repeat(spacer_width)));
        spans.push(Span::styled(endpoint, desc_style));
    }

    Line::from(spans)
}

/// Render notification over the status line.
/// - Error: Red text with "Error:" prefix and bold styling
/// - Info: Green text without prefix
fn render_notification(frame: &mut Frame, notification: &Notification, area: Rect) {
    frame.render_widget(Clear, area);

    let line = match notification.level {
        NotificationLevel::Error => Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
            ),
            Span::styled(notification.message.clone(), Style::default().fg(COLOR_ERROR)),
        ]),
        NotificationLevel::Info => Line::from(Span::styled(
            notification.message.clone(),
            Style::default().fg(Color::Green),
        )),
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Centered modal for a blocking notice.
fn render_notice(frame: &mut Frame, message: &str, area: Rect) {
    let width = (message.chars().count() as u16 + 6)
        .max(24)
        .min(area.width);
    let height = 5.min(area.height);
    let modal = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, modal);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .title(" Notice ");
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(COLOR_TEXT_MUTED),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        modal,
    );
}
