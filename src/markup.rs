//! HTML fragments for transcript and panel content.
//!
//! Everything that reaches the document is an HTML fragment. Plain text is
//! escaped on the way in; markdown goes through a [`MarkdownRenderer`], whose
//! output is sanitized. The terminal frontend turns fragments back into
//! display lines with [`text_lines`].

use std::sync::OnceLock;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::Regex;

/// Escape text for insertion into an HTML fragment.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markdown to sanitized HTML.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// pulldown-cmark backed renderer.
///
/// Raw HTML blocks and inline HTML are emitted as escaped text, and
/// `javascript:` link targets are replaced with `#`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CmarkRenderer;

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let events = Parser::new_ext(text, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: neutralize_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: neutralize_url(dest_url),
                title,
                id,
            }),
            other => other,
        });

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

fn neutralize_url(url: CowStr<'_>) -> CowStr<'_> {
    let lowered = url.trim_start().to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("vbscript:")
        || lowered.starts_with("data:")
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Render `text` as markdown when a renderer is available, else escape it.
pub fn render_or_escape(renderer: Option<&dyn MarkdownRenderer>, text: &str) -> String {
    match renderer {
        Some(r) => r.render(text),
        None => escape_html(text),
    }
}

/// How a display line should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Paragraph,
    ListItem,
    Code,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub kind: LineKind,
    pub text: String,
}

impl TextLine {
    fn blank() -> Self {
        Self {
            kind: LineKind::Blank,
            text: String::new(),
        }
    }
}

enum ListKind {
    Bullet,
    Ordered(usize),
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>").expect("static tag regex")
    })
}

/// Decode the entities [`escape_html`] and pulldown-cmark produce.
pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

struct LineBuilder {
    lines: Vec<TextLine>,
    buf: String,
    kind: LineKind,
    marker: Option<String>,
    lists: Vec<ListKind>,
    in_pre: bool,
}

impl LineBuilder {
    fn flush(&mut self) {
        if self.in_pre {
            for raw in self.buf.trim_matches('\n').split('\n') {
                self.lines.push(TextLine {
                    kind: LineKind::Code,
                    text: decode_entities(raw),
                });
            }
            self.buf.clear();
            return;
        }

        let collapsed = self.buf.split_whitespace().collect::<Vec<_>>().join(" ");
        self.buf.clear();
        if collapsed.is_empty() {
            return;
        }
        let mut text = decode_entities(&collapsed);
        if let Some(marker) = self.marker.take() {
            text = format!("{}{}", marker, text);
        }
        self.lines.push(TextLine {
            kind: self.kind,
            text,
        });
        self.kind = LineKind::Paragraph;
    }

    fn open(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                if !self.lines.is_empty() {
                    self.lines.push(TextLine::blank());
                }
                self.kind = LineKind::Heading;
            }
            "p" | "div" | "br" | "tr" => self.flush(),
            "ul" => {
                self.flush();
                self.lists.push(ListKind::Bullet);
            }
            "ol" => {
                self.flush();
                self.lists.push(ListKind::Ordered(0));
            }
            "li" => {
                self.flush();
                self.kind = LineKind::ListItem;
                let depth = self.lists.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                self.marker = Some(match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        *n += 1;
                        format!("{}{}. ", indent, n)
                    }
                    _ => format!("{}• ", indent),
                });
            }
            "pre" => {
                self.flush();
                self.in_pre = true;
            }
            "td" | "th" => self.buf.push_str(" | "),
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "div" | "li" | "tr" => self.flush(),
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "pre" => {
                self.flush();
                self.in_pre = false;
            }
            _ => {}
        }
    }
}

/// Flatten an HTML fragment into styled display lines.
pub fn text_lines(fragment: &str) -> Vec<TextLine> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        buf: String::new(),
        kind: LineKind::Paragraph,
        marker: None,
        lists: Vec::new(),
        in_pre: false,
    };

    let mut last = 0;
    for caps in tag_regex().captures_iter(fragment) {
        let Some(whole) = caps.get(0) else { continue };
        builder.buf.push_str(&fragment[last..whole.start()]);
        last = whole.end();

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let name = caps
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        if closing {
            builder.close(&name);
        } else {
            builder.open(&name);
        }
    }
    builder.buf.push_str(&fragment[last..]);
    builder.flush();
    builder.lines
}
