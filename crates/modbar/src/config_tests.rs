// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;
use yare::parameterized;

#[test]
fn defaults_are_info_text_with_signals_enabled() {
    let config = Config::parse_from(["modbar"]);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.log_format, "text");
    assert!(!config.no_signals);
    assert_eq!(config.stop_signal, None);
    assert_eq!(config.cont_signal, None);
}

#[parameterized(
    level = { &["modbar", "--log-level", "debug"] },
    format = { &["modbar", "--log-format", "json"] },
    no_signals = { &["modbar", "--no-signals"] },
)]
fn parses_without_error(args: &[&str]) {
    Config::parse_from(args);
}

#[test]
fn overrides_stop_and_cont_signal() {
    let config = Config::parse_from(["modbar", "--stop-signal", "34", "--cont-signal", "35"]);
    assert_eq!(config.stop_signal, Some(34));
    assert_eq!(config.cont_signal, Some(35));
}

#[test]
fn init_tracing_does_not_panic_on_repeated_calls() {
    let config = Config::parse_from(["modbar", "--log-level", "debug"]);
    init_tracing(&config);
    init_tracing(&config);
}
