use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Names the log file; logging is off when unset.
const LOG_ENV: &str = "JADIS_LOG";

/// Initialize tracing with optional file output.
///
/// Logging is disabled by default so that stderr carries only diagnostics.
/// Set `JADIS_LOG` to a file path to enable it; `RUST_LOG` sets the filter.
///
/// Log files get unique names so concurrent runs do not clobber each other:
/// `{path}.{timestamp}.{pid}`
pub fn init_tracing() {
    let Some(log_path) = std::env::var_os(LOG_ENV).filter(|p| !p.is_empty()) else {
        return;
    };

    let unique_path = log_file_path(
        PathBuf::from(log_path),
        chrono::Utc::now().timestamp(),
        std::process::id(),
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {}", unique_path.display());
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}

fn log_file_path(base: PathBuf, timestamp: i64, pid: u32) -> PathBuf {
    let mut name = base.into_os_string();
    name.push(format!(".{}.{}", timestamp, pid));
    PathBuf::from(name)
}
