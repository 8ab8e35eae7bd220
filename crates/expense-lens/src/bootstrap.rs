use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
const STATE_DIR: &str = ".expense-lens";

/// Default expenses document name.
const DATA_FILE_NAME: &str = "expensas.csv";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.expense-lens/` and `~/.expense-lens/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let state_dir = home.join(STATE_DIR);
    std::fs::create_dir_all(&state_dir)?;
    std::fs::create_dir_all(state_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` accepts the CLI level names and falls back to `"info"`.
/// Output goes to `log_file` (appending, no ANSI colours) when given,
/// otherwise to stderr so stdout stays reserved for the rendered views.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Map a CLI level name to an `EnvFilter` directive.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate the expenses document when `--data-file` is not given.
///
/// Checks, in order:
/// 1. `./data/expensas.csv`
/// 2. `~/.expense-lens/expensas.csv`
pub fn discover_data_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let home = dirs::home_dir();
    discover_data_path_in(&cwd, home.as_deref())
}

fn discover_data_path_in(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = vec![cwd.join("data").join(DATA_FILE_NAME)];
    if let Some(home) = home {
        candidates.push(home.join(STATE_DIR).join(DATA_FILE_NAME));
    }
    candidates.into_iter().find(|p| p.is_file())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── test_ensure_directories ───────────────────────────────────────────────

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");

        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories();

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");

        let state_dir = tmp.path().join(STATE_DIR);
        assert!(state_dir.is_dir(), ".expense-lens dir must exist");
        assert!(state_dir.join("logs").is_dir(), "logs subdir must exist");
    }

    // ── test_level_directive ──────────────────────────────────────────────────

    #[test]
    fn test_level_directive_maps_cli_names() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("trace"), "trace");
    }

    // ── test_discover_data_path ───────────────────────────────────────────────

    #[test]
    fn test_discover_returns_none_when_absent() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        assert!(discover_data_path_in(cwd.path(), Some(home.path())).is_none());
    }

    #[test]
    fn test_discover_prefers_working_directory() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        let local = cwd.path().join("data").join(DATA_FILE_NAME);
        let state = home.path().join(STATE_DIR).join(DATA_FILE_NAME);
        for path in [&local, &state] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "mes,categoria,monto\n").unwrap();
        }

        assert_eq!(
            discover_data_path_in(cwd.path(), Some(home.path())),
            Some(local)
        );
    }

    #[test]
    fn test_discover_falls_back_to_state_dir() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        let state = home.path().join(STATE_DIR).join(DATA_FILE_NAME);
        std::fs::create_dir_all(state.parent().unwrap()).unwrap();
        std::fs::write(&state, "mes,categoria,monto\n").unwrap();

        assert_eq!(
            discover_data_path_in(cwd.path(), Some(home.path())),
            Some(state)
        );
    }
}
