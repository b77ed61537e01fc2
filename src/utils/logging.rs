//! Tracing bootstrap shared by the library and the viewer binary

use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log file written under [`resolve_log_dir`] with `local-logging`
pub const LOG_FILE_NAME: &str = "viewer.log";

pub fn local_logging_enabled() -> bool {
    cfg!(feature = "local-logging")
}

/// `./log` under the working directory
pub fn resolve_log_dir() -> io::Result<PathBuf> {
    Ok(std::env::current_dir()?.join("log"))
}

/// `RUST_LOG` when set, `devbyte_viewer=<default_level>` otherwise
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devbyte_viewer={default_level}")))
}

/// Install the global subscriber; a second call is a no-op.
///
/// With `local-logging` the log goes to [`LOG_FILE_NAME`], falling back to
/// stderr when the directory cannot be created.
pub fn init_tracing(default_level: &str) {
    let filter = env_filter(default_level);

    #[cfg(feature = "local-logging")]
    {
        match open_log_writer() {
            Ok(writer) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .with_ansi(false)
                    .try_init();
                return;
            }
            Err(err) => eprintln!("File logging unavailable, using stderr: {err}"),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(feature = "local-logging")]
fn open_log_writer() -> io::Result<tracing_appender::non_blocking::NonBlocking> {
    use std::sync::OnceLock;
    use tracing_appender::non_blocking::WorkerGuard;

    static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    let log_dir = resolve_log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}
