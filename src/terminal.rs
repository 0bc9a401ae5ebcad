//! Raw-mode terminal session.
//!
//! The menu draws on stderr so stdout stays free for the selected option.
//! Raw mode and the alternate screen are released when the session is
//! restored or dropped and when the process panics. Signals are left to the
//! host process unless it opts in with [`install_signal_restore`].

use std::io::{self, Stderr, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::error::{MenuError, MenuResult};
use crate::ui;
use crate::Screen;

/// Whether some session currently holds the terminal in raw mode.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

static PANIC_HOOK_INSTALLED: Once = Once::new();

static SIGNAL_HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Exit code used when a signal ends the menu (128 + SIGINT).
const SIGNAL_EXIT_CODE: i32 = 130;

/// Terminal in raw mode on the alternate screen, drawing to stderr.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stderr>>,
    restored: bool,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen.
    pub fn enter() -> MenuResult<Self> {
        install_panic_hook();

        enable_raw_mode().map_err(|e| MenuError::terminal("failed to enable raw mode", e))?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        if let Err(e) = execute!(io::stderr(), EnterAlternateScreen, Hide) {
            restore_terminal();
            return Err(MenuError::terminal("failed to enter the alternate screen", e));
        }

        let terminal = match Terminal::new(CrosstermBackend::new(io::stderr())) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_terminal();
                return Err(MenuError::terminal("failed to set up the terminal", e));
            }
        };

        tracing::debug!("terminal session entered");
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    /// Leave the alternate screen and raw mode. Safe to call more than once.
    pub fn restore(&mut self) -> MenuResult<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);

        let screen = execute!(io::stderr(), Show, LeaveAlternateScreen);
        let raw = disable_raw_mode();
        screen.map_err(|e| MenuError::terminal("failed to leave the alternate screen", e))?;
        raw.map_err(|e| MenuError::terminal("failed to disable raw mode", e))?;
        tracing::debug!("terminal session restored");
        Ok(())
    }
}

impl Screen for TerminalSession {
    fn show(&mut self, app: &mut App) -> io::Result<()> {
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Best-effort restore used from the panic hook and signal handler.
/// Returns whether a session was active.
fn restore_terminal() -> bool {
    if !RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        return false;
    }
    let mut stderr = io::stderr();
    let _ = execute!(stderr, Show, LeaveAlternateScreen);
    let _ = stderr.flush();
    let _ = disable_raw_mode();
    true
}

/// Install the panic hook once per process. It only acts while a session
/// holds the terminal and then defers to the previous hook.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

/// Opt-in process-wide handler for SIGINT, SIGTERM, and SIGHUP that
/// restores the terminal and exits with status 130.
///
/// Meant for binaries that own the process. Libraries embedding the menu
/// keep their own signal handling and should not call this. Calling it
/// again after a successful install is a no-op.
pub fn install_signal_restore() -> Result<(), ctrlc::Error> {
    if SIGNAL_HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    // With the termination feature this also covers SIGTERM and SIGHUP.
    let result = ctrlc::set_handler(|| {
        if restore_terminal() {
            tracing::info!("terminal restored after signal");
        }
        std::process::exit(SIGNAL_EXIT_CODE);
    });
    if result.is_err() {
        SIGNAL_HANDLER_INSTALLED.store(false, Ordering::SeqCst);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_session_is_noop() {
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
        assert!(!restore_terminal());
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panic_hook_install_is_idempotent() {
        install_panic_hook();
        install_panic_hook();
        assert!(PANIC_HOOK_INSTALLED.is_completed());
        assert!(!SIGNAL_HANDLER_INSTALLED.load(Ordering::SeqCst));
    }
}
