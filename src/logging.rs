use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Result, SeriesError};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `service` logs at INFO along with
/// request traces from `tower_http`.
pub fn init_logger(service: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http={}",
            service,
            Level::INFO,
            Level::INFO
        ))
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| SeriesError::Internal(format!("Failed to initialize logger: {}", e)))
}
