//! Menu configuration.

use crate::keys::KeyBackend;
use crate::matcher::MatchMode;

/// Options recognized by [`run_menu`](crate::run_menu).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuConfig {
    /// Show the key help line under the options.
    pub show_help: bool,

    /// Commit as soon as a filter pass leaves exactly one option.
    pub autoselect: bool,

    /// Mode the query starts in.
    pub default_mode: MatchMode,

    /// Whether fuzzy mode is reachable with `Tab`.
    /// When disabled `Tab` toggles literal <-> regex.
    pub fuzzy: bool,

    /// First `Enter` copies the selected option into the query,
    /// a second `Enter` on an unchanged query commits.
    pub complete_on_enter: bool,

    /// Style highlights and markers. Disabled means plain text.
    pub color: bool,

    /// Which key reader to use.
    pub keys: KeyBackend,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            show_help: true,
            autoselect: false,
            default_mode: MatchMode::Literal,
            fuzzy: true,
            complete_on_enter: false,
            color: true,
            keys: KeyBackend::Auto,
        }
    }
}
