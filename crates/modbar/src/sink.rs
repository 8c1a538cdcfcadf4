// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sink (§4.E): the emission surface handed to module code and shared
//! by every downstream reader. Built on [`tokio::sync::watch`] rather than
//! [`crate::notifier::Notifier`] because a sink routinely has more than one
//! concurrent reader (the module set's aggregator and a module's own timed
//! refresh loop) — `watch` coalesces like `Notifier` does, but each
//! subscriber tracks its own "have I seen the latest" position instead of
//! racing to consume a single permit.

use tokio::sync::watch;

pub struct Sink<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> Sink<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Sink { tx }
    }

    /// Publish a new value, waking every subscriber.
    pub fn emit(&self, value: T) {
        let _ = self.tx.send(Some(value));
    }

    pub fn current(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// An independent handle that can wait for the next change without
    /// racing other subscribers for it.
    pub fn subscribe(&self) -> SinkWatcher<T> {
        SinkWatcher { rx: self.tx.subscribe() }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber's view of a [`Sink`]: its own position in the value
/// sequence, independent of any other subscriber's.
pub struct SinkWatcher<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> SinkWatcher<T> {
    /// Wait for the next emission not yet observed by this watcher (or one
    /// already pending), returning the current value.
    pub async fn changed(&mut self) -> Option<T> {
        if self.rx.changed().await.is_err() {
            return self.rx.borrow().clone();
        }
        self.rx.borrow().clone()
    }

    pub fn current(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}

impl<T> Clone for SinkWatcher<T> {
    fn clone(&self) -> Self {
        SinkWatcher { rx: self.rx.clone() }
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
