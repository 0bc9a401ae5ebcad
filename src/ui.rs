use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

#[cfg(test)]
extern crate insta;

use crate::app::App;
use crate::matcher::{FilteredEntry, MatchMode};
use crate::widgets::{
    build_highlighted_text, push_edit_cursor, push_selection_cursor, UiStyles,
};

/// Everything that determines what the menu looks like.
#[derive(Debug, Clone, Copy)]
pub struct MenuView<'a> {
    pub title: &'a str,
    pub show_help: bool,
    pub complete_on_enter: bool,
    pub mode: MatchMode,
    pub query: &'a str,
    pub entries: &'a [FilteredEntry],
    pub selected: usize,
    /// Number of options before filtering.
    pub total: usize,
    /// The regex did not compile and `entries` is unfiltered.
    pub invalid_pattern: bool,
}

impl MenuView<'_> {
    /// Lines below the option list.
    pub fn footer_height(&self) -> u16 {
        if self.show_help {
            3
        } else {
            2
        }
    }
}

/// Main render function called from the event loop. Updates the list
/// scroll for the height that is actually available.
pub fn render(frame: &mut Frame, app: &mut App) {
    let styles = if app.config.color {
        UiStyles::from_palette(&app.palette())
    } else {
        UiStyles::plain()
    };
    let footer_height = app.view().footer_height();

    let area = frame.area();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                  // options
            Constraint::Length(footer_height), // help, status, input
        ])
        .split(area);

    let list_height = outer[0].height as usize;
    app.ensure_visible(list_height);
    let offset = app.scroll();
    let view = app.view();
    let options: Vec<Line> = option_lines(&view, &styles)
        .into_iter()
        .skip(offset)
        .take(list_height)
        .collect();
    frame.render_widget(Paragraph::new(options), outer[0]);
    frame.render_widget(Paragraph::new(footer_lines(&view, &styles)), outer[1]);
}

/// All lines of the menu, top to bottom, without scrolling.
pub fn menu_lines(view: &MenuView<'_>, styles: &UiStyles) -> Vec<Line<'static>> {
    let mut lines = option_lines(view, styles);
    lines.extend(footer_lines(view, styles));
    lines
}

fn option_lines(view: &MenuView<'_>, styles: &UiStyles) -> Vec<Line<'static>> {
    view.entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let is_selected = i == view.selected;
            let (normal, highlight) = if is_selected {
                (styles.selected, styles.selected_highlight)
            } else {
                (styles.normal, styles.highlight)
            };
            let mut spans = Vec::new();
            push_selection_cursor(&mut spans, is_selected, styles);
            spans.extend(build_highlighted_text(
                &entry.text,
                &entry.highlights,
                normal,
                highlight,
            ));
            Line::from(spans)
        })
        .collect()
}

fn footer_lines(view: &MenuView<'_>, styles: &UiStyles) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if view.show_help {
        let enter = if view.complete_on_enter {
            "enter complete/select"
        } else {
            "enter select"
        };
        lines.push(Line::from(Span::styled(
            format!("{enter}  tab mode  esc clear  ↑↓ move  ctrl+c quit"),
            styles.help,
        )));
    }

    let mut status = vec![Span::styled(
        format!("[{}] {}/{}", view.mode.label(), view.entries.len(), view.total),
        styles.status,
    )];
    if view.invalid_pattern {
        status.push(Span::styled("  invalid pattern, showing all", styles.error));
    }
    lines.push(Line::from(status));

    let mut input = vec![
        Span::styled(view.title.to_string(), styles.title),
        Span::raw(" > "),
    ];
    push_edit_cursor(&mut input, view.query, styles);
    lines.push(Line::from(input));

    lines
}
