use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Resolve the filter directive used when `RUST_LOG` is absent.
///
/// `DEBUG_MODE=true` wins over `LOG_LEVEL`; unknown levels fall back to `info`.
pub fn default_directive(debug_mode: bool, log_level: Option<&str>) -> String {
    if debug_mode {
        return "debug".to_string();
    }
    match log_level.map(|l| l.trim().to_ascii_lowercase()) {
        Some(level) if matches!(level.as_str(), "error" | "warn" | "info" | "debug" | "trace") => {
            level
        }
        _ => "info".to_string(),
    }
}

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(debug_mode: bool, log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug_mode, log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
