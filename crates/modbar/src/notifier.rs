// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A coalescing, edge-triggered notifier (§4.C): any number of `notify()`
//! calls between two `notified()` awaits collapse into a single wake, so a
//! waiter that was busy doing something else never sees more wakes than
//! edges it missed plus one.

use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct Notifier(Arc<Notify>);

impl Notifier {
    pub fn new() -> Self {
        Notifier(Arc::new(Notify::new()))
    }

    /// Record an edge. Coalesces with any edge not yet observed by
    /// `notified()`.
    pub fn notify(&self) {
        self.0.notify_one();
    }

    /// Wait for the next (possibly already-pending) edge.
    pub async fn notified(&self) {
        self.0.notified().await;
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
