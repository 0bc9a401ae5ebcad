use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file when `--log-file` is not given.
pub const LOG_FILE_ENV: &str = "QUICKPICK_LOG";

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_LEVEL_ENV: &str = "QUICKPICK_LOG_LEVEL";

/// Resolve the log destination: the CLI flag wins over the environment.
pub fn log_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env::var_os(LOG_FILE_ENV).map(PathBuf::from))
}

/// Send tracing output to a file. The terminal belongs to the menu, so
/// nothing is installed when no file was requested.
pub fn init_tracing(path: Option<&Path>) -> color_eyre::Result<()> {
    let Some(path) = log_path(path) else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            color_eyre::eyre::eyre!("Failed to open log file '{}': {}", path.display(), e)
        })?;

    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to install logger: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_environment() {
        let path = log_path(Some(Path::new("/tmp/menu.log")));
        assert_eq!(path, Some(PathBuf::from("/tmp/menu.log")));
    }
}
