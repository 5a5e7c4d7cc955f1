use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::env;
use std::io::Write;

fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs the global logger. Safe to call more than once; later calls are
/// ignored.
pub fn init_logging() {
    let log_level = parse_level(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

    let mut builder = Builder::from_default_env();

    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        match record.level() {
            Level::Info => writeln!(
                buf,
                "{} [INFO] [{}]: {}",
                timestamp,
                record.target(),
                record.args()
            ),
            level => writeln!(
                buf,
                "{} [{}] [{}:{}] {}: {}",
                timestamp,
                level,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.target(),
                record.args()
            ),
        }
    });

    if env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production" {
        builder.filter_module("reqwest", LevelFilter::Warn);
        builder.filter_module("hyper", LevelFilter::Warn);
        builder.filter_module("sqlx", LevelFilter::Warn);
    }

    let _ = builder.filter_level(log_level).target(Target::Stdout).try_init();
}

pub fn log_error_with_context(error: &dyn std::error::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    let mut source = error.source();
    while let Some(err) = source {
        log::error!("  Caused by: {}", err);
        source = err.source();
    }
}

pub fn log_sync_stage(account_id: &str, stage: &str) {
    log::info!("[Sync] account '{}' entered {}", account_id, stage);
}

pub fn log_store_operation(operation: &str, namespace: &str, records: usize) {
    log::debug!("[Store] {} on '{}' ({} records)", operation, namespace, records);
}
