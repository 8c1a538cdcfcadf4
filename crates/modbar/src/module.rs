// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module lifecycle (§4.F): the `Module` trait user code implements, the
//! capability descriptor that replaces runtime "does this implement X"
//! dispatch (§9), and the `CoreModule` wrapper that gives any `Module`
//! restart-on-panic, restart-on-click, replay, and timed-refresh behavior
//! without the module author having to write any of it.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::event::{is_primary_button, BUTTON_MIDDLE};
use crate::notifier::Notifier;
use crate::segment::{MinWidth, Output, Segment};
use crate::sink::{Sink, SinkWatcher};
use crate::timing::Timing;

/// A capability a module may or may not support, exposed as data instead of
/// a marker trait so the host can check `is_some()` instead of downcasting
/// (§9 redesign note).
pub type RefreshFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct ModuleCapabilities {
    /// Called when a primary-button click should make the module recompute
    /// its value immediately, independent of its own schedule.
    pub refresh: Option<RefreshFn>,
}

/// User-implemented unit of work that produces [`Output`] over time (§4.F).
/// `run` takes `self: Arc<Self>` rather than `&self` so the core wrapper can
/// invoke the very same instance again after a restart.
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn capabilities(&self) -> ModuleCapabilities {
        ModuleCapabilities::default()
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
}

/// Lifecycle state of a [`CoreModule`] (§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Starting,
    Running,
    Finished,
}

/// The emission surface passed into [`Module::run`]. Every `emit` call is
/// decorated with click wiring and fed to the shared sink and timed-refresh
/// machinery identically, whether it came from the module itself, a replay,
/// or a timed re-render.
#[derive(Clone)]
pub struct ModuleEmit {
    inner: Arc<Inner>,
}

impl ModuleEmit {
    pub fn emit(&self, output: impl Output + 'static) {
        let boxed: Arc<dyn Output> = Arc::new(output);
        self.inner.publish(boxed);
    }

    /// Convenience (§4.E): if `err` is `Some`, emit a single error segment —
    /// text "Error", short text "!", urgent, with `err` attached as the
    /// segment's error value — and return `true`; otherwise do nothing and
    /// return `false`. Equivalent to `error_with_placeholder(err, "!")`.
    pub fn error(&self, err: Option<impl Into<String>>) -> bool {
        self.error_with_placeholder(err, "!")
    }

    /// Same as [`error`](Self::error), with a custom `min_width` placeholder
    /// for the error segment instead of the default `"!"`.
    pub fn error_with_placeholder(&self, err: Option<impl Into<String>>, placeholder: impl Into<String>) -> bool {
        let Some(message) = err else { return false };
        let mut seg = Segment::text("Error");
        seg.set_short_text("!");
        seg.set_urgent(true);
        seg.set_min_width(MinWidth::Placeholder(placeholder.into()));
        seg.set_error(Some(message.into()));
        self.emit(seg);
        true
    }
}

struct Inner {
    module: Arc<dyn Module>,
    capabilities: ModuleCapabilities,
    sink: Sink<Vec<Segment>>,
    /// The module's genuine last output, undecorated — what timed refresh
    /// re-asks for `next_refresh` and what replay recomputes decoration from.
    last_raw: Mutex<Option<Arc<dyn Output>>>,
    /// The segments currently shown to the host, post-decoration — what a
    /// restart drops error segments from (§4.F).
    last_displayed: Mutex<Vec<Segment>>,
    state: Mutex<ModuleState>,
    restart: Notifier,
    replay: Notifier,
    timing: Timing,
    shutdown: CancellationToken,
}

impl Inner {
    fn store_and_emit(&self, segments: Vec<Segment>) {
        *self.last_displayed.lock() = segments.clone();
        self.sink.emit(segments);
    }

    /// Store `output` as the module's genuine last output, decorate it for
    /// the current lifecycle state, and publish. The path every *running*
    /// emission (module, timed refresh) goes through.
    fn publish(&self, output: Arc<dyn Output>) {
        *self.last_raw.lock() = Some(Arc::clone(&output));
        let state = *self.state.lock();
        let segments = self.decorate_for_state(output.segments(), state);
        self.store_and_emit(segments);
    }

    fn decorate_for_state(&self, segments: Vec<Segment>, state: ModuleState) -> Vec<Segment> {
        match state {
            ModuleState::Finished => self.decorate_finished(segments),
            ModuleState::Starting | ModuleState::Running => self.decorate_running(segments),
        }
    }

    /// Refreshable-frame contract (§4.F): a non-error segment's middle-click
    /// calls `refresh` (its original handler still fires first); an error
    /// segment's left/middle/right wire to `refresh`. Non-refreshable
    /// modules (no `capabilities.refresh`) leave segments untouched — the
    /// host itself already routes an error segment's right-click to the
    /// configured error handler and any other button to its own handler.
    fn decorate_running(&self, mut segments: Vec<Segment>) -> Vec<Segment> {
        let Some(refresh) = self.capabilities.refresh.clone() else {
            return segments;
        };
        for seg in &mut segments {
            let is_error = seg.is_error();
            let original = seg.click_handler();
            let refresh = refresh.clone();
            seg.on_click(move |ev| {
                if is_error {
                    if is_primary_button(ev.button) {
                        refresh();
                    }
                    return;
                }
                if let Some(handler) = &original {
                    handler(ev);
                }
                if ev.button == BUTTON_MIDDLE {
                    refresh();
                }
            });
        }
        segments
    }

    /// On entry to `finished` (§4.F): every segment's click handler —
    /// error or not — is replaced with one that signals restart on
    /// left/right/middle and swallows scroll/side-button clicks. Refresh
    /// wiring never applies to a finished frame.
    fn decorate_finished(&self, mut segments: Vec<Segment>) -> Vec<Segment> {
        for seg in &mut segments {
            let restart = self.restart.clone();
            seg.on_click(move |ev| {
                if is_primary_button(ev.button) {
                    restart.notify();
                }
            });
        }
        segments
    }

    fn publish_error(&self, message: &str) {
        let mut seg = Segment::text(format!("[{}] {}", self.module.name(), message));
        seg.set_error(Some(message.to_owned()));
        self.publish(Arc::new(seg));
    }

    /// Transition into `finished`: re-decorate the module's genuine last
    /// output with restart wiring and display it (§4.F).
    fn enter_finished(&self) {
        *self.state.lock() = ModuleState::Finished;
        let segments = self.last_raw.lock().clone().map(|o| o.segments()).unwrap_or_default();
        let decorated = self.decorate_finished(segments);
        self.store_and_emit(decorated);
    }

    /// On a restart signal while finished (§4.F): drop error segments from
    /// the retained displayed output and re-emit immediately, before the
    /// caller starts a fresh `stream` invocation.
    fn handle_restart(&self) {
        let retained = self.last_displayed.lock().clone();
        let filtered: Vec<Segment> = retained.into_iter().filter(|s| !s.is_error()).collect();
        self.store_and_emit(filtered);
    }

    /// Re-send the last output (§4.F): finished frames are already
    /// restart-decorated and stable, so just resend; frames from any other
    /// state are recomputed so refresh-capable click handlers stay current.
    fn replay(&self) {
        if *self.state.lock() == ModuleState::Finished {
            let segments = self.last_displayed.lock().clone();
            self.sink.emit(segments);
        } else if let Some(output) = self.last_raw.lock().clone() {
            self.publish(output);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "module panicked".to_owned()
    }
}

async fn run_loop(inner: Arc<Inner>) {
    loop {
        if inner.shutdown.is_cancelled() {
            return;
        }
        *inner.state.lock() = ModuleState::Starting;
        let emit = ModuleEmit { inner: Arc::clone(&inner) };
        let module = Arc::clone(&inner.module);
        *inner.state.lock() = ModuleState::Running;

        let result = AssertUnwindSafe(module.run(emit)).catch_unwind().await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => inner.publish_error(&err.to_string()),
            Err(panic) => inner.publish_error(&panic_message(panic)),
        }
        inner.enter_finished();

        tokio::select! {
            _ = inner.shutdown.cancelled() => return,
            _ = inner.restart.notified() => {}
        }
        inner.handle_restart();
    }
}

async fn replay_loop(inner: Arc<Inner>) {
    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => return,
            _ = inner.replay.notified() => {}
        }
        inner.replay();
    }
}

/// Re-renders a `TimedOutput`'s segments whenever its `next_refresh` comes
/// due, without the module re-emitting anything (§3, §4.F).
async fn timed_loop(inner: Arc<Inner>) {
    let scheduler = inner.timing.scheduler();
    let mut watcher = inner.sink.subscribe();
    loop {
        let current = inner.last_raw.lock().clone();
        let next_refresh = current.as_ref().and_then(|o| o.as_timed()).map(|t| t.next_refresh());

        match next_refresh {
            None => {
                tokio::select! {
                    _ = inner.shutdown.cancelled() => return,
                    _ = watcher.changed() => {}
                }
            }
            Some(t) if t.is_zero() => {
                tokio::select! {
                    _ = inner.shutdown.cancelled() => return,
                    _ = watcher.changed() => {}
                }
            }
            Some(t) => {
                scheduler.at(t);
                tokio::select! {
                    _ = inner.shutdown.cancelled() => return,
                    fired = scheduler.tick() => {
                        if fired {
                            let current = inner.last_raw.lock().clone();
                            if let Some(output) = current {
                                inner.publish(output);
                            }
                        }
                    }
                    _ = watcher.changed() => {}
                }
            }
        }
    }
}

/// Wraps a [`Module`] with restart, replay, and timed-refresh behavior
/// (§4.F). Spawns its background tasks on construction; dropping the
/// `CoreModule` does not stop them — `ModuleSet` owns the set of
/// `CoreModule`s for the process lifetime.
pub struct CoreModule {
    inner: Arc<Inner>,
}

impl CoreModule {
    /// Spawn with a dedicated, never-shared shutdown token — convenient for
    /// standalone tests; `ModuleSet` uses [`spawn_with_shutdown`](Self::spawn_with_shutdown)
    /// instead so every module in a host shuts down together.
    pub fn spawn(module: Arc<dyn Module>, timing: Timing) -> CoreModule {
        Self::spawn_with_shutdown(module, timing, CancellationToken::new())
    }

    /// Spawn the module's background tasks (run, replay, timed-refresh),
    /// all of which exit promptly once `shutdown` is cancelled (SPEC_FULL
    /// §2.4 cooperative shutdown) instead of outliving the host as orphaned
    /// tasks.
    pub(crate) fn spawn_with_shutdown(module: Arc<dyn Module>, timing: Timing, shutdown: CancellationToken) -> CoreModule {
        let capabilities = module.capabilities();
        let inner = Arc::new(Inner {
            module,
            capabilities,
            sink: Sink::new(),
            last_raw: Mutex::new(None),
            last_displayed: Mutex::new(Vec::new()),
            state: Mutex::new(ModuleState::Starting),
            restart: Notifier::new(),
            replay: Notifier::new(),
            timing,
            shutdown,
        });
        tokio::spawn(run_loop(Arc::clone(&inner)));
        tokio::spawn(replay_loop(Arc::clone(&inner)));
        tokio::spawn(timed_loop(Arc::clone(&inner)));
        CoreModule { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.module.name()
    }

    pub fn state(&self) -> ModuleState {
        *self.inner.state.lock()
    }

    pub fn current_segments(&self) -> Vec<Segment> {
        self.inner.sink.current().unwrap_or_default()
    }

    pub fn subscribe(&self) -> SinkWatcher<Vec<Segment>> {
        self.inner.sink.subscribe()
    }

    pub fn request_restart(&self) {
        self.inner.restart.notify();
    }

    pub fn request_replay(&self) {
        self.inner.replay.notify();
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
