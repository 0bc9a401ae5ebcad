use std::io::{self, BufRead, IsTerminal, Read};
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use quickpick::{KeyBackend, MatchMode, MenuConfig, MenuError, Outcome};

mod logging;

/// Interactive terminal picker: filter options as you type and print the one you choose
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Options to choose from. Read from stdin, one per line, when omitted
    options: Vec<String>,

    /// Title shown in front of the query
    #[arg(short, long, default_value = "select")]
    title: String,

    /// Hide the key help line
    #[arg(long)]
    no_help: bool,

    /// Commit as soon as only one option matches
    #[arg(long)]
    autoselect: bool,

    /// Mode the query starts in
    #[arg(long, value_enum, default_value_t = MatchMode::Literal)]
    mode: MatchMode,

    /// Make Tab toggle between literal and regex only
    #[arg(long)]
    no_fuzzy: bool,

    /// First Enter completes the query to the selected option
    #[arg(long)]
    complete: bool,

    /// Disable colors (also honored via NO_COLOR)
    #[arg(long)]
    no_color: bool,

    /// Key reader to use
    #[arg(long, value_enum, default_value_t = KeyBackend::Auto)]
    keys: KeyBackend,

    /// Append debug logs to this file (or set QUICKPICK_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Generate usage spec for this tool
    #[arg(long)]
    usage: bool,
}

impl Args {
    fn menu_config(&self) -> MenuConfig {
        MenuConfig {
            show_help: !self.no_help,
            autoselect: self.autoselect,
            default_mode: self.mode,
            fuzzy: !self.no_fuzzy,
            complete_on_enter: self.complete,
            color: !self.no_color && std::env::var_os("NO_COLOR").is_none(),
            keys: self.keys,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Handle --usage flag to output usage spec
    if args.usage {
        let mut cmd = Args::command();
        let bin_name = std::env::args()
            .next()
            .unwrap_or_else(|| "quickpick".to_string());
        let mut buf = Vec::new();
        clap_usage::generate(&mut cmd, bin_name, &mut buf);
        print!("{}", String::from_utf8_lossy(&buf));
        return Ok(());
    }

    logging::init_tracing(args.log_file.as_deref())?;

    let from_stdin = args.options.is_empty();
    let options = if from_stdin {
        read_stdin_options()?
    } else {
        args.options.clone()
    };

    let config = args.menu_config();
    tracing::info!(options = options.len(), ?config, "starting menu");

    // This process owns the terminal, so signals may restore it and exit.
    if let Err(e) = quickpick::terminal::install_signal_restore() {
        tracing::warn!(error = %e, "could not install signal handler");
    }

    match quickpick::run_menu(&args.title, &options, config) {
        Ok(Outcome::Selected(choice)) => {
            println!("{choice}");
            Ok(())
        }
        Ok(Outcome::Cancelled) => std::process::exit(130),
        Err(e) if e.is_terminal_failure() && !from_stdin => {
            tracing::warn!(error = %e, "falling back to line input");
            eprintln!("{e}; reading the query from stdin instead");
            fallback_select(&options, config.default_mode)
        }
        Err(MenuError::EmptyCandidateList) => Err(color_eyre::eyre::eyre!(
            "No options given. Pass them as arguments or pipe them on stdin."
        )),
        Err(e) => Err(e.into()),
    }
}

/// Read non-empty lines from stdin as options.
fn read_stdin_options() -> color_eyre::Result<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(color_eyre::eyre::eyre!(
            "No options given. Pass them as arguments or pipe them on stdin."
        ));
    }
    let mut input = String::new();
    stdin
        .lock()
        .read_to_string(&mut input)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read options from stdin: {}", e))?;
    Ok(input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// Non-interactive path: read one query line and print the first match.
fn fallback_select(options: &[String], mode: MatchMode) -> color_eyre::Result<()> {
    let mut query = String::new();
    io::stdin()
        .lock()
        .read_line(&mut query)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read query from stdin: {}", e))?;

    match quickpick::select_non_interactive(options, query.trim_end(), mode) {
        Some(choice) => {
            println!("{choice}");
            Ok(())
        }
        None => Err(color_eyre::eyre::eyre!(
            "No option matches '{}'",
            query.trim_end()
        )),
    }
}
