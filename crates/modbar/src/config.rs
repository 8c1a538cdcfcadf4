// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CLI surface and ambient logging setup (SPEC_FULL §2.1, §2.3). Modules
//! themselves are out of scope for this crate (§1), so `Config` only governs
//! the host's own lifecycle: logging, signal handling, and the pause/resume
//! signal numbers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// i3bar-protocol module-host daemon.
#[derive(Debug, Parser)]
#[command(name = "modbar", version, about)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MODBAR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "MODBAR_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Do not install SIGUSR1/SIGUSR2 pause/resume handlers, and omit the
    /// corresponding header fields (§4.H, §6).
    #[arg(long, env = "MODBAR_NO_SIGNALS")]
    pub no_signals: bool,

    /// Override the numeric signal used to pause the bar (default SIGUSR1).
    #[arg(long, env = "MODBAR_STOP_SIGNAL")]
    pub stop_signal: Option<i32>,

    /// Override the numeric signal used to resume the bar (default SIGUSR2).
    #[arg(long, env = "MODBAR_CONT_SIGNAL")]
    pub cont_signal: Option<i32>,
}

/// Initialize tracing from `config`. Uses `try_init` so it's safe to call
/// more than once (e.g. from tests) — matching the teacher's convention.
///
/// Precedence: `--log-level`/`MODBAR_LOG_LEVEL` > `RUST_LOG` > `"info"`.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = if std::env::var("MODBAR_LOG_LEVEL").is_err() && config.log_level == "info" {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
