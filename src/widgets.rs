//! Styled span helpers for the menu lines.
//!
//! Every style goes through [`UiStyles`], so switching to
//! [`UiStyles::plain`] drops all styling and leaves the text intact.

use std::ops::Range;

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use ratatui_themes::ThemePalette;

/// Styles for each UI role, derived from the active theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiStyles {
    pub normal: Style,
    pub selected: Style,
    pub highlight: Style,
    pub selected_highlight: Style,
    pub marker: Style,
    pub help: Style,
    pub status: Style,
    pub error: Style,
    pub title: Style,
    pub query: Style,
    pub cursor: Style,
}

impl UiStyles {
    pub fn from_palette(p: &ThemePalette) -> Self {
        let selected_bg = match p.selection {
            Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
            _ => Color::Rgb(40, 40, 60),
        };

        Self {
            normal: Style::default().fg(p.fg),
            selected: Style::default()
                .fg(p.fg)
                .bg(selected_bg)
                .add_modifier(Modifier::BOLD),
            highlight: Style::default()
                .fg(p.warning)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            selected_highlight: Style::default()
                .fg(p.bg)
                .bg(p.warning)
                .add_modifier(Modifier::BOLD),
            marker: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            help: Style::default().fg(p.muted),
            status: Style::default().fg(p.info),
            error: Style::default().fg(p.error),
            title: Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            query: Style::default().fg(p.fg),
            cursor: Style::default()
                .fg(p.accent)
                .add_modifier(Modifier::SLOW_BLINK),
        }
    }

    /// No styling at all, for terminals without color support.
    pub fn plain() -> Self {
        let none = Style::default();
        Self {
            normal: none,
            selected: none,
            highlight: none,
            selected_highlight: none,
            marker: none,
            help: none,
            status: none,
            error: none,
            title: none,
            query: none,
            cursor: none,
        }
    }
}

/// Push the selection marker (`▶ ` or two spaces).
pub fn push_selection_cursor(spans: &mut Vec<Span<'static>>, is_selected: bool, styles: &UiStyles) {
    if is_selected {
        spans.push(Span::styled("▶ ", styles.marker));
    } else {
        spans.push(Span::raw("  "));
    }
}

/// Split `text` into spans, styling the given byte ranges with `highlight`.
/// Ranges that are out of bounds or not on char boundaries are skipped.
pub fn build_highlighted_text(
    text: &str,
    ranges: &[Range<usize>],
    normal: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for range in ranges {
        let valid = range.start >= last
            && range.start < range.end
            && range.end <= text.len()
            && text.is_char_boundary(range.start)
            && text.is_char_boundary(range.end);
        if !valid {
            continue;
        }
        if last < range.start {
            spans.push(Span::styled(text[last..range.start].to_string(), normal));
        }
        spans.push(Span::styled(text[range.clone()].to_string(), highlight));
        last = range.end;
    }

    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), normal));
    }
    spans
}

/// Push the query text followed by the cursor marker.
pub fn push_edit_cursor(spans: &mut Vec<Span<'static>>, query: &str, styles: &UiStyles) {
    spans.push(Span::styled(query.to_string(), styles.query));
    spans.push(Span::styled("▎", styles.cursor));
}
