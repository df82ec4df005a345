use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// "RUST_LOG" takes precedence over the configured level
pub fn init_logging(level: LevelFilter) {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, true),
        Err(_) => (EnvFilter::new(level.to_string()), false),
    };

    let fmt_layer = fmt::layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    if !from_env {
        info!("\"RUST_LOG\" variable not set, using log level {level}");
    }
}

// Log an error and every one of its causes
pub fn log_error_chain(err: &anyhow::Error) {
    for e in err.chain() {
        error!("{e}");
    }
}
