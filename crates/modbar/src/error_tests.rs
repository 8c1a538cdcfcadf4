// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use super::*;

#[test]
fn protocol_errors_format_with_their_message() {
    let err = HostError::Protocol("bad header".to_owned());
    assert_eq!(err.to_string(), "protocol error: bad header");
}

#[test]
fn io_errors_are_wrapped_and_chained() {
    let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let err: HostError = io_err.into();
    assert!(err.to_string().contains("pipe closed"));
    assert!(std::error::Error::source(&err).is_some());
}
