use std::env::var;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(app: &str) -> Option<WorkerGuard> {
    initialize_tracing(app, LevelFilter::INFO)
}

/// Initialize tracing subscriber with default configuration.
///
/// Console output is compact by default; set RUST_LOG_FORMAT=json for
/// structured output. When LOGS_DIR is set, a daily-rotated JSON log file
/// named after the app is written there as well. The returned guard must
/// stay alive for the lifetime of the process so buffered file output is
/// flushed on shutdown.
fn initialize_tracing(app: &str, level: LevelFilter) -> Option<WorkerGuard> {
    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let console_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter(level)).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter(level))
            .boxed(),
    };

    let mut layers = vec![console_layer];
    let mut guard = None;

    if let Ok(dir) = var("LOGS_DIR") {
        if !dir.is_empty() {
            let appender = tracing_appender::rolling::daily(&dir, format!("{app}.log"));
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .json()
                    .with_filter(env_filter(level))
                    .boxed(),
            );
            guard = Some(file_guard);
        }
    }

    tracing_subscriber::registry().with(layers).init();

    guard
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}
