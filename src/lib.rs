//! Interactive terminal picker.
//!
//! [`run_menu`] shows a list of options, filters it as the user types
//! (literal substrings, regular expressions, or fuzzy similarity), and
//! returns the option they commit to.
//!
//! ```no_run
//! use quickpick::{run_menu, MenuConfig, Outcome};
//!
//! let options = ["add item", "remove item", "clear all", "exit"];
//! match run_menu("todo", &options, MenuConfig::default())? {
//!     Outcome::Selected(choice) => println!("{choice}"),
//!     Outcome::Cancelled => {}
//! }
//! # Ok::<(), quickpick::MenuError>(())
//! ```

use std::io;

pub mod app;
pub mod config;
pub mod error;
pub mod keys;
pub mod matcher;
pub mod terminal;
pub mod ui;
mod widgets;

pub use app::{App, Outcome, Step};
pub use config::MenuConfig;
pub use error::{MenuError, MenuResult};
pub use keys::{KeyBackend, KeyEvent, KeyReader};
pub use matcher::MatchMode;

use matcher::CandidateMatcher;
use terminal::TerminalSession;

/// Where the run loop draws each frame. Drawing may move the list scroll.
pub trait Screen {
    fn show(&mut self, app: &mut App) -> io::Result<()>;
}

/// Show an interactive menu and block until the user commits or quits.
///
/// Fails with [`MenuError::EmptyCandidateList`] before touching the terminal
/// when `options` is empty, and with
/// [`MenuError::TerminalConfiguration`] when raw mode is unavailable.
pub fn run_menu<S: AsRef<str>>(
    title: &str,
    options: &[S],
    config: MenuConfig,
) -> MenuResult<Outcome> {
    let app = App::new(title, options, config)?;
    if let Some(outcome) = app.autoselected() {
        tracing::info!(?outcome, "autoselected without prompting");
        return Ok(outcome);
    }

    let mut keys = config.keys.open()?;
    let mut session = TerminalSession::enter()?;
    let result = drive(&mut session, keys.as_mut(), app);
    let restored = session.restore();

    let outcome = result?;
    restored?;
    Ok(outcome)
}

/// The draw / read / apply loop.
pub fn drive(
    screen: &mut dyn Screen,
    keys: &mut dyn KeyReader,
    app: App,
) -> MenuResult<Outcome> {
    if let Some(outcome) = app.autoselected() {
        return Ok(outcome);
    }

    let mut app = app;
    loop {
        screen.show(&mut app)?;
        let key = keys.read_key()?;
        tracing::trace!(?key, "key read");

        match app.apply(key) {
            Step::Continue(next) => {
                tracing::debug!(
                    query = next.query(),
                    mode = ?next.mode(),
                    selected = next.selected_index(),
                    shown = next.entries().len(),
                    "menu updated"
                );
                app = next;
            }
            Step::Done(outcome) => {
                tracing::info!(?outcome, "menu finished");
                return Ok(outcome);
            }
        }
    }
}

/// Pick without a terminal: the first option `query` keeps in `mode`.
pub fn select_non_interactive<S: AsRef<str>>(
    options: &[S],
    query: &str,
    mode: MatchMode,
) -> Option<String> {
    let mut matcher = CandidateMatcher::new();
    matcher
        .filter(options, query, mode)
        .entries
        .into_iter()
        .next()
        .map(|entry| entry.text)
}
