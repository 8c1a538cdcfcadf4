// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The module set (§4.G): the registry of every [`CoreModule`] the host is
//! running, plus one unbuffered stream of "this index just changed" events
//! so the host's main loop only has to watch a single channel instead of
//! juggling N watchers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::module::{CoreModule, Module};
use crate::segment::Segment;
use crate::timing::Timing;

pub struct ModuleSet {
    modules: Vec<CoreModule>,
    timing: Timing,
    shutdown: CancellationToken,
    changed_tx: mpsc::UnboundedSender<usize>,
    changed_rx: mpsc::UnboundedReceiver<usize>,
}

impl ModuleSet {
    /// Build a set whose modules share a dedicated, never-cancelled shutdown
    /// token — fine for standalone tests. [`BarHost`](crate::host::BarHost)
    /// uses [`new_with_shutdown`](Self::new_with_shutdown) so every module
    /// shuts down together with the host's own loop.
    pub fn new(timing: Timing) -> Self {
        Self::new_with_shutdown(timing, CancellationToken::new())
    }

    pub(crate) fn new_with_shutdown(timing: Timing, shutdown: CancellationToken) -> Self {
        let (changed_tx, changed_rx) = mpsc::unbounded_channel();
        ModuleSet { modules: Vec::new(), timing, shutdown, changed_tx, changed_rx }
    }

    /// Register and start a module, returning its stable index.
    pub fn add(&mut self, module: Arc<dyn Module>) -> usize {
        let core = CoreModule::spawn_with_shutdown(module, self.timing.clone(), self.shutdown.clone());
        let index = self.modules.len();
        let mut watcher = core.subscribe();
        let changed_tx = self.changed_tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = watcher.changed() => {
                        if changed_tx.send(index).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.modules.push(core);
        index
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.modules.get(index).map(CoreModule::name)
    }

    pub fn last_output(&self, index: usize) -> Vec<Segment> {
        self.modules.get(index).map(CoreModule::current_segments).unwrap_or_default()
    }

    pub fn last_outputs(&self) -> Vec<Vec<Segment>> {
        self.modules.iter().map(CoreModule::current_segments).collect()
    }

    pub fn request_restart(&self, index: usize) {
        if let Some(m) = self.modules.get(index) {
            m.request_restart();
        }
    }

    pub fn request_replay_all(&self) {
        for m in &self.modules {
            m.request_replay();
        }
    }

    /// Await the next output change from any module, returning its index
    /// (§4.G `stream() -> update_stream<int>`). This is unbuffered in the
    /// sense that matters to the host: every change is delivered, but the
    /// consumer is expected to re-read `last_outputs()` promptly rather than
    /// queue many indices before reacting (§3 invariant, §5 ordering).
    pub async fn update_stream(&mut self) -> Option<usize> {
        self.changed_rx.recv().await
    }
}

#[cfg(test)]
#[path = "module_set_tests.rs"]
mod tests;
