// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Errors surfaced by the protocol codec and the bar host's own plumbing.
/// Module failures are not represented here — they're caught per-module and
/// turned into error segments (§4.F).
#[derive(Debug)]
pub enum HostError {
    Protocol(String),
    Io(std::io::Error),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            HostError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Protocol(_) => None,
            HostError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::Io(err)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
