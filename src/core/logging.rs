//! Structured logging setup.
//!
//! Writes JSON logs to a daily-rolling file and pretty logs to stdout,
//! both gated by the same [`tracing_subscriber::EnvFilter`]. Level is
//! controlled by `THAI_TOKENIZER_LOG_LEVEL`, falling back to `RUST_LOG`,
//! falling back to `info`.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    if let Ok(level) = std::env::var("THAI_TOKENIZER_LOG_LEVEL") {
        return EnvFilter::new(level);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes global tracing: JSON file layer + pretty stdout layer. The
/// returned guard must be held for the process lifetime to flush buffered
/// log lines on shutdown.
pub fn init(log_dir: &std::path::Path) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);
    let file_appender = tracing_appender::rolling::daily(log_dir, "thai-tokenizer-sidecar.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(env_filter());

    tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
    tracing_log::LogTracer::init().ok();

    guard
}

/// Default log directory: `$XDG_DATA_HOME/thai-tokenizer-sidecar/logs`, or
/// `./logs` if no data directory can be resolved.
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("thai-tokenizer-sidecar").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
