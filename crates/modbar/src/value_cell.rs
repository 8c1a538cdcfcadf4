// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thread-safe holder for the most recently produced value (§4.D). No
//! history, no queue — just "what's the latest", read and written from
//! different tasks, plus a subscription edge-stream that fires once per
//! distinct `set` so a reactive reader never has to poll.

use parking_lot::RwLock;
use tokio::sync::watch;

pub struct ValueCell<T> {
    inner: RwLock<Option<T>>,
    version: watch::Sender<u64>,
}

impl<T: Clone> ValueCell<T> {
    pub fn new() -> Self {
        let (version, _rx) = watch::channel(0);
        ValueCell { inner: RwLock::new(None), version }
    }

    pub fn set(&self, value: T) {
        *self.inner.write() = Some(value);
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    pub fn get(&self) -> Option<T> {
        self.inner.read().clone()
    }

    pub fn take(&self) -> Option<T> {
        self.inner.write().take()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Subscribe to edge notifications, one per distinct `set` (§4.D). The
    /// returned watcher is the event stream; dropping it (or calling
    /// `unsubscribe`) stops delivery.
    pub fn subscribe(&self) -> ValueCellWatcher {
        ValueCellWatcher { rx: self.version.subscribe() }
    }
}

impl<T: Clone> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber's view of a [`ValueCell`]'s edge stream (§4.D).
pub struct ValueCellWatcher {
    rx: watch::Receiver<u64>,
}

impl ValueCellWatcher {
    /// Wait for the next distinct `set` not yet observed by this watcher.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Stop receiving notifications. Equivalent to dropping the watcher;
    /// provided so callers can express unsubscription explicitly.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
#[path = "value_cell_tests.rs"]
mod tests;
