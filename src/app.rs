use ratatui_interact::components::InputState;
use ratatui_themes::{ThemeName, ThemePalette};

use crate::config::MenuConfig;
use crate::error::{MenuError, MenuResult};
use crate::keys::KeyEvent;
use crate::matcher::{CandidateMatcher, FilterView, FilteredEntry, MatchMode};
use crate::ui::MenuView;

/// Marker inside an option that `complete_on_enter` leaves out of the query,
/// so `"run [args]"` completes to `"run "`.
pub const ARGS_PLACEHOLDER: &str = "[args]";

/// How a menu invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The display text of the committed option.
    Selected(String),
    /// The user quit with Ctrl+C.
    Cancelled,
}

/// Result of applying one key to the menu state.
pub enum Step {
    /// Still editing; redraw and read the next key.
    Continue(App),
    /// Terminal state reached.
    Done(Outcome),
}

/// Menu state: query, mode, selection, and the filtered view derived from them.
pub struct App {
    pub title: String,

    /// Display text of every option, in caller order.
    pub candidates: Vec<String>,

    pub config: MenuConfig,

    /// Current color theme.
    pub theme_name: ThemeName,

    /// The typed query.
    query: InputState,

    mode: MatchMode,

    /// Cursor into `view.entries`. Always 0 when the view is empty.
    selected: usize,

    /// First entry shown in the list window.
    scroll: usize,

    view: FilterView,

    matcher: CandidateMatcher,
}

impl App {
    /// Build the initial state. Fails when there is nothing to pick from.
    pub fn new<S: AsRef<str>>(title: &str, options: &[S], config: MenuConfig) -> MenuResult<Self> {
        if options.is_empty() {
            return Err(MenuError::EmptyCandidateList);
        }

        let candidates = options
            .iter()
            .map(|o| o.as_ref().replace(['\r', '\n'], ""))
            .collect();

        let mut app = Self {
            title: title.to_string(),
            candidates,
            config,
            theme_name: ThemeName::default(),
            query: InputState::empty(),
            mode: config.default_mode,
            selected: 0,
            scroll: 0,
            view: FilterView::default(),
            matcher: CandidateMatcher::new(),
        };
        app.refilter();
        Ok(app)
    }

    /// Get the current theme palette.
    pub fn palette(&self) -> ThemePalette {
        self.theme_name.palette()
    }

    pub fn query(&self) -> &str {
        self.query.text()
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Move the list window only as far as needed to show the selection.
    pub fn ensure_visible(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + viewport_height {
            self.scroll = self.selected + 1 - viewport_height;
        }
        self.scroll = self
            .scroll
            .min(self.view.len().saturating_sub(viewport_height));
    }

    pub fn entries(&self) -> &[FilteredEntry] {
        &self.view.entries
    }

    pub fn filter_view(&self) -> &FilterView {
        &self.view
    }

    /// The entry under the cursor, if any survived the filter.
    pub fn selected_entry(&self) -> Option<&FilteredEntry> {
        self.view.entries.get(self.selected)
    }

    /// Snapshot of everything the renderer needs.
    pub fn view(&self) -> MenuView<'_> {
        MenuView {
            title: &self.title,
            show_help: self.config.show_help,
            complete_on_enter: self.config.complete_on_enter,
            mode: self.mode,
            query: self.query.text(),
            entries: &self.view.entries,
            selected: self.selected,
            total: self.candidates.len(),
            invalid_pattern: self.view.invalid.is_some(),
        }
    }

    /// The outcome autoselect produces for the current view, if it applies.
    pub fn autoselected(&self) -> Option<Outcome> {
        if self.config.autoselect && self.view.len() == 1 {
            let text = self.view.entries[0].text.clone();
            return Some(Outcome::Selected(text));
        }
        None
    }

    /// Apply one key event.
    pub fn apply(mut self, key: KeyEvent) -> Step {
        match key {
            KeyEvent::Char(c) if !c.is_control() => {
                self.query.insert_char(c);
                self.refilter_from_top()
            }
            KeyEvent::Char(_) | KeyEvent::Unknown => Step::Continue(self),
            KeyEvent::Backspace => {
                self.query.delete_char_backward();
                self.refilter_from_top()
            }
            KeyEvent::Escape => {
                self.query.clear();
                self.refilter_from_top()
            }
            KeyEvent::Tab => {
                self.mode = self.mode.toggled(self.config.fuzzy);
                self.refilter();
                self.clamp_selection();
                self.after_filter()
            }
            KeyEvent::Up => {
                self.selected = self.selected.saturating_sub(1);
                Step::Continue(self)
            }
            KeyEvent::Down => {
                if self.selected + 1 < self.view.len() {
                    self.selected += 1;
                }
                Step::Continue(self)
            }
            KeyEvent::Enter => self.handle_enter(),
            KeyEvent::CtrlC => Step::Done(Outcome::Cancelled),
        }
    }

    fn handle_enter(mut self) -> Step {
        let Some(entry) = self.selected_entry() else {
            return Step::Continue(self);
        };
        let (index, text) = (entry.index, entry.text.clone());
        let completion = text.replace(ARGS_PLACEHOLDER, "");

        if self.config.complete_on_enter && self.query.text() != completion {
            self.query.set_text(completion);
            self.refilter();
            // Keep the cursor on the option that was completed.
            self.selected = self
                .view
                .entries
                .iter()
                .position(|e| e.index == index)
                .unwrap_or(0);
            return self.after_filter();
        }

        Step::Done(Outcome::Selected(text))
    }

    fn refilter(&mut self) {
        self.view = self
            .matcher
            .filter(&self.candidates, self.query.text(), self.mode);
    }

    /// Re-run the matcher and put the cursor back on the first entry.
    fn refilter_from_top(mut self) -> Step {
        self.refilter();
        self.selected = 0;
        self.after_filter()
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.view.len().saturating_sub(1));
    }

    fn after_filter(self) -> Step {
        match self.autoselected() {
            Some(outcome) => Step::Done(outcome),
            None => Step::Continue(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MENU: [&str; 4] = ["add item", "remove item", "clear all", "exit"];

    fn sample_app() -> App {
        App::new("menu", &MENU, MenuConfig::default()).unwrap()
    }

    fn app_with(config: MenuConfig) -> App {
        App::new("menu", &MENU, config).unwrap()
    }

    fn press(app: App, key: KeyEvent) -> App {
        match app.apply(key) {
            Step::Continue(app) => app,
            Step::Done(outcome) => panic!("unexpected outcome {outcome:?}"),
        }
    }

    fn finish(app: App, key: KeyEvent) -> Outcome {
        match app.apply(key) {
            Step::Continue(app) => panic!("still editing with query {:?}", app.query()),
            Step::Done(outcome) => outcome,
        }
    }

    fn type_text(mut app: App, text: &str) -> App {
        for c in text.chars() {
            app = press(app, KeyEvent::Char(c));
        }
        app
    }

    fn shown(app: &App) -> Vec<&str> {
        app.entries().iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_app_creation() {
        let app = sample_app();
        assert_eq!(app.query(), "");
        assert_eq!(app.mode(), MatchMode::Literal);
        assert_eq!(app.selected_index(), 0);
        assert_eq!(shown(&app), MENU.to_vec());
    }

    #[test]
    fn test_empty_options_are_rejected() {
        let options: [&str; 0] = [];
        let result = App::new("menu", &options, MenuConfig::default());
        assert!(matches!(result, Err(MenuError::EmptyCandidateList)));
    }

    #[test]
    fn test_newlines_are_stripped_from_options() {
        let app = App::new("menu", &["one\n", "two\r\n"], MenuConfig::default()).unwrap();
        assert_eq!(app.candidates, vec!["one", "two"]);
    }

    #[test]
    fn test_default_mode_from_config() {
        let app = app_with(MenuConfig {
            default_mode: MatchMode::Regex,
            ..MenuConfig::default()
        });
        assert_eq!(app.mode(), MatchMode::Regex);
    }

    #[test]
    fn test_typing_filters_and_enter_selects() {
        let app = type_text(sample_app(), "ad");
        assert_eq!(shown(&app), vec!["add item"]);
        assert_eq!(
            finish(app, KeyEvent::Enter),
            Outcome::Selected("add item".to_string())
        );
    }

    #[test]
    fn test_typing_resets_selection() {
        let app = press(press(sample_app(), KeyEvent::Down), KeyEvent::Down);
        assert_eq!(app.selected_index(), 2);
        let app = press(app, KeyEvent::Char('i'));
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_control_chars_are_ignored() {
        let app = press(sample_app(), KeyEvent::Char('\u{7}'));
        assert_eq!(app.query(), "");
    }

    #[test]
    fn test_backspace() {
        let app = type_text(sample_app(), "exz");
        assert!(app.entries().is_empty());
        let app = press(app, KeyEvent::Backspace);
        assert_eq!(app.query(), "ex");
        assert_eq!(shown(&app), vec!["exit"]);
    }

    #[test]
    fn test_backspace_on_empty_query() {
        let app = press(press(sample_app(), KeyEvent::Down), KeyEvent::Backspace);
        assert_eq!(app.query(), "");
        assert_eq!(app.selected_index(), 0);
        assert_eq!(shown(&app), MENU.to_vec());
    }

    #[test]
    fn test_escape_clears_and_is_idempotent() {
        let app = press(type_text(sample_app(), "item"), KeyEvent::Down);
        let once = press(app, KeyEvent::Escape);
        assert_eq!(once.query(), "");
        assert_eq!(once.selected_index(), 0);
        assert_eq!(shown(&once), MENU.to_vec());

        let twice = press(once, KeyEvent::Escape);
        assert_eq!(twice.query(), "");
        assert_eq!(twice.selected_index(), 0);
        assert_eq!(shown(&twice), MENU.to_vec());
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut app = press(sample_app(), KeyEvent::Up);
        assert_eq!(app.selected_index(), 0);
        for _ in 0..10 {
            app = press(app, KeyEvent::Down);
        }
        assert_eq!(app.selected_index(), 3);
        let app = press(app, KeyEvent::Up);
        assert_eq!(app.selected_index(), 2);
        assert_eq!(
            finish(app, KeyEvent::Enter),
            Outcome::Selected("clear all".to_string())
        );
    }

    #[test]
    fn test_down_on_empty_view() {
        let app = press(type_text(sample_app(), "zzz"), KeyEvent::Down);
        assert_eq!(app.selected_index(), 0);
        assert!(app.selected_entry().is_none());
    }

    #[test]
    fn test_enter_on_empty_view_is_noop() {
        let app = press(type_text(sample_app(), "zzz"), KeyEvent::Enter);
        assert_eq!(app.query(), "zzz");
    }

    #[test]
    fn test_ctrl_c_cancels() {
        assert_eq!(finish(sample_app(), KeyEvent::CtrlC), Outcome::Cancelled);
        let app = type_text(sample_app(), "re");
        assert_eq!(finish(app, KeyEvent::CtrlC), Outcome::Cancelled);
    }

    #[test]
    fn test_unknown_key_changes_nothing() {
        let app = press(type_text(sample_app(), "i"), KeyEvent::Down);
        let before = (app.query().to_string(), app.selected_index(), app.mode());
        let app = press(app, KeyEvent::Unknown);
        assert_eq!(
            (app.query().to_string(), app.selected_index(), app.mode()),
            before
        );
    }

    #[test]
    fn test_tab_with_empty_query_keeps_list() {
        let app = app_with(MenuConfig {
            default_mode: MatchMode::Regex,
            ..MenuConfig::default()
        });
        let app = press(app, KeyEvent::Tab);
        assert_eq!(app.mode(), MatchMode::Fuzzy);
        assert_eq!(shown(&app), MENU.to_vec());
    }

    #[test]
    fn test_tab_keeps_selection() {
        let app = press(press(sample_app(), KeyEvent::Down), KeyEvent::Down);
        let app = press(app, KeyEvent::Tab);
        assert_eq!(app.mode(), MatchMode::Regex);
        assert_eq!(app.selected_index(), 2);
    }

    #[test]
    fn test_tab_clamps_against_new_view() {
        let app = type_text(sample_app(), "e i");
        assert_eq!(shown(&app), vec!["add item", "remove item", "exit"]);
        let app = press(press(app, KeyEvent::Down), KeyEvent::Down);
        assert_eq!(app.selected_index(), 2);

        // As a regex the space is literal, so only one option survives.
        let app = press(app, KeyEvent::Tab);
        assert_eq!(app.mode(), MatchMode::Regex);
        assert_eq!(shown(&app), vec!["remove item"]);
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_tab_without_fuzzy_toggles_literal_and_regex() {
        let app = app_with(MenuConfig {
            fuzzy: false,
            ..MenuConfig::default()
        });
        let app = press(app, KeyEvent::Tab);
        assert_eq!(app.mode(), MatchMode::Regex);
        let app = press(app, KeyEvent::Tab);
        assert_eq!(app.mode(), MatchMode::Literal);
    }

    #[test]
    fn test_invalid_regex_shows_everything() {
        let app = app_with(MenuConfig {
            default_mode: MatchMode::Regex,
            ..MenuConfig::default()
        });
        let app = type_text(app, "(ad");
        assert!(app.filter_view().invalid.is_some());
        assert_eq!(shown(&app), MENU.to_vec());
        let app = press(app, KeyEvent::Char(')'));
        assert!(app.filter_view().invalid.is_none());
        assert_eq!(shown(&app), vec!["add item"]);
    }

    #[test]
    fn test_autoselect_commits_without_enter() {
        let app = app_with(MenuConfig {
            autoselect: true,
            ..MenuConfig::default()
        });
        let app = press(app, KeyEvent::Char('e'));
        assert_eq!(shown(&app).len(), 4);
        assert_eq!(
            finish(app, KeyEvent::Char('x')),
            Outcome::Selected("exit".to_string())
        );
    }

    #[test]
    fn test_autoselect_is_off_by_default() {
        let app = type_text(sample_app(), "ex");
        assert_eq!(shown(&app), vec!["exit"]);
        assert!(app.autoselected().is_none());
    }

    #[test]
    fn test_autoselect_on_single_option() {
        let config = MenuConfig {
            autoselect: true,
            ..MenuConfig::default()
        };
        let app = App::new("menu", &["only"], config).unwrap();
        assert_eq!(app.autoselected(), Some(Outcome::Selected("only".to_string())));
    }

    #[test]
    fn test_complete_on_enter() {
        let app = app_with(MenuConfig {
            complete_on_enter: true,
            ..MenuConfig::default()
        });
        let app = press(type_text(app, "item"), KeyEvent::Down);
        let app = press(app, KeyEvent::Enter);
        assert_eq!(app.query(), "remove item");
        assert_eq!(app.selected_entry().map(|e| e.text.as_str()), Some("remove item"));
        assert_eq!(
            finish(app, KeyEvent::Enter),
            Outcome::Selected("remove item".to_string())
        );
    }

    #[test]
    fn test_complete_on_enter_drops_args_placeholder() {
        let options = ["run [args]", "stop", "status"];
        let config = MenuConfig {
            complete_on_enter: true,
            ..MenuConfig::default()
        };
        let app = App::new("menu", &options, config).unwrap();
        let app = press(type_text(app, "ru"), KeyEvent::Enter);
        assert_eq!(app.query(), "run ");
        assert_eq!(app.selected_entry().map(|e| e.text.as_str()), Some("run [args]"));
        assert_eq!(
            finish(app, KeyEvent::Enter),
            Outcome::Selected("run [args]".to_string())
        );
    }

    fn long_app() -> App {
        let options: Vec<String> = (1..=10).map(|i| format!("option {i}")).collect();
        App::new("pick", &options, MenuConfig::default()).unwrap()
    }

    #[test]
    fn test_ensure_visible_scrolls_only_when_needed() {
        let mut app = long_app();
        for _ in 0..7 {
            app = press(app, KeyEvent::Down);
        }
        app.ensure_visible(5);
        assert_eq!(app.scroll(), 3);

        // Moving up inside the window keeps it where it is.
        app = press(app, KeyEvent::Up);
        app.ensure_visible(5);
        assert_eq!(app.scroll(), 3);
        for _ in 0..3 {
            app = press(app, KeyEvent::Up);
            app.ensure_visible(5);
        }
        assert_eq!(app.selected_index(), 3);
        assert_eq!(app.scroll(), 3);

        // Leaving the top edge drags the window along.
        app = press(app, KeyEvent::Up);
        app.ensure_visible(5);
        assert_eq!(app.scroll(), 2);
    }

    #[test]
    fn test_ensure_visible_after_filter_shrinks() {
        let mut app = long_app();
        for _ in 0..9 {
            app = press(app, KeyEvent::Down);
        }
        app.ensure_visible(5);
        assert_eq!(app.scroll(), 5);

        let mut app = press(app, KeyEvent::Char('1'));
        app.ensure_visible(5);
        assert_eq!(app.selected_index(), 0);
        assert_eq!(app.scroll(), 0);
    }

    #[test]
    fn test_ensure_visible_with_zero_height() {
        let mut app = press(long_app(), KeyEvent::Down);
        app.ensure_visible(0);
        assert_eq!(app.scroll(), 0);
    }

    #[test]
    fn test_selection_stays_in_bounds_for_any_key_sequence() {
        let keys = [
            KeyEvent::Char('a'),
            KeyEvent::Char('e'),
            KeyEvent::Char('x'),
            KeyEvent::Char('i'),
            KeyEvent::Char(' '),
            KeyEvent::Char('('),
            KeyEvent::Backspace,
            KeyEvent::Escape,
            KeyEvent::Tab,
            KeyEvent::Up,
            KeyEvent::Down,
            KeyEvent::Down,
            KeyEvent::Unknown,
        ];
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut app = sample_app();
        for _ in 0..5_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let key = keys[(seed % keys.len() as u64) as usize];
            app = press(app, key);
            let len = app.entries().len();
            if len == 0 {
                assert_eq!(app.selected_index(), 0);
                assert!(app.selected_entry().is_none());
            } else {
                assert!(app.selected_index() < len, "{} >= {len}", app.selected_index());
            }
        }
    }

    #[test]
    fn test_view_reflects_state() {
        let app = press(type_text(sample_app(), "item"), KeyEvent::Down);
        let view = app.view();
        assert_eq!(view.title, "menu");
        assert_eq!(view.query, "item");
        assert_eq!(view.selected, 1);
        assert_eq!(view.total, 4);
        assert_eq!(view.entries.len(), 2);
        assert!(!view.invalid_pattern);
    }
}
