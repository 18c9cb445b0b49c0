// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_FILE_PREFIX: &str = "mapstash.log";

// Keep the guard alive until exit or buffered lines are lost.
pub fn init(configured_level: &str, dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {} -- set [log].dir", dir.display()))?;

    let directive = filter_directive(std::env::var("RUST_LOG").ok(), configured_level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?} -- check RUST_LOG"))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(guard)
}

fn filter_directive(rust_log: Option<String>, configured_level: &str) -> String {
    match rust_log {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured_level.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::filter_directive;

    #[test]
    fn rust_log_wins_over_configured_level() {
        assert_eq!(
            filter_directive(Some("mapstash_db=trace".to_owned()), "info"),
            "mapstash_db=trace"
        );
    }

    #[test]
    fn blank_rust_log_falls_back_to_config() {
        assert_eq!(filter_directive(Some("  ".to_owned()), "warn"), "warn");
        assert_eq!(filter_directive(None, "debug"), "debug");
    }
}
