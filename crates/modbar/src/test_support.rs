// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canned raw modules (§4.K) used by the integration tests to exercise every
//! scenario in spec.md §8 without pulling in a real module implementation —
//! individual modules are out of scope for this crate (§1).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::module::{Module, ModuleCapabilities, ModuleEmit, RefreshFn};
use crate::segment::{Output, Segment, TimedOutput};
use crate::timing::{Instant, Timing};

/// Emits one text segment, then blocks forever (S1's `"hello"` module, and
/// the "finished" half of the module lifecycle when paired with
/// [`OnceThenFinishModule`]).
pub struct BlockingTextModule {
    pub name: &'static str,
    pub text: &'static str,
}

impl Module for BlockingTextModule {
    fn name(&self) -> &str {
        self.name
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            emit.emit(Segment::text(self.text));
            std::future::pending::<()>().await;
            #[allow(unreachable_code)]
            Ok(())
        })
    }
}

/// Emits a given sequence of segments (one per call), one at a time, waiting
/// for an external `advance` signal between each — lets a test control
/// exactly when "a" and then "b" land, as in spec.md S4.
pub struct SteppedModule {
    pub name: &'static str,
    pub steps: Vec<&'static str>,
    pub advance: Arc<tokio::sync::Notify>,
}

impl Module for SteppedModule {
    fn name(&self) -> &str {
        self.name
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            for step in &self.steps {
                self.advance.notified().await;
                emit.emit(Segment::text(*step));
            }
            std::future::pending::<()>().await;
            #[allow(unreachable_code)]
            Ok(())
        })
    }
}

/// Emits an error segment, then a plain "ok" segment, then finishes — the
/// module used by spec.md S3 ("restart after error").
pub struct ErrorThenFinishModule {
    pub name: &'static str,
    pub error_message: &'static str,
    pub ok_text: &'static str,
}

impl Module for ErrorThenFinishModule {
    fn name(&self) -> &str {
        self.name
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            emit.error(Some(self.error_message));
            emit.emit(Segment::text(self.ok_text));
            Ok(())
        })
    }
}

/// A `TimedOutput` counting whole elapsed seconds since module start,
/// re-rendering every `period` until `ttl` elapses, after which it goes
/// static — used by spec.md S5 ("timed output in test mode"). Reads the
/// live clock on every call so the core's re-render-without-re-emission
/// mechanism (§3, §4.F) is what advances the displayed count, not the
/// module itself.
pub struct ElapsedSecondsOutput {
    start: Instant,
    period: Duration,
    ttl: Duration,
    timing: Timing,
}

impl Output for ElapsedSecondsOutput {
    fn segments(&self) -> Vec<Segment> {
        let elapsed = self.timing.now().saturating_sub(self.start).as_secs();
        vec![Segment::text(format!("{elapsed}s"))]
    }

    fn as_timed(&self) -> Option<&dyn TimedOutput> {
        Some(self)
    }
}

impl TimedOutput for ElapsedSecondsOutput {
    fn next_refresh(&self) -> Instant {
        let elapsed = self.timing.now().saturating_sub(self.start);
        if elapsed >= self.ttl {
            return Instant::ZERO;
        }
        let periods_elapsed = elapsed.as_nanos() / self.period.as_nanos();
        let next = self.period * (periods_elapsed as u32 + 1);
        self.start + next
    }
}

pub struct ElapsedSecondsModule {
    pub name: &'static str,
    pub period: Duration,
    pub ttl: Duration,
    pub timing: Timing,
}

impl Module for ElapsedSecondsModule {
    fn name(&self) -> &str {
        self.name
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            let start = self.timing.now();
            emit.emit(ElapsedSecondsOutput { start, period: self.period, ttl: self.ttl, timing: self.timing.clone() });
            std::future::pending::<()>().await;
            #[allow(unreachable_code)]
            Ok(())
        })
    }
}

/// A module whose capability descriptor advertises `refresh`, counting how
/// many times it has been called — used to exercise the refreshable-frame
/// click wiring (§4.F).
pub struct RefreshCountingModule {
    pub name: &'static str,
    pub text: &'static str,
    pub refresh_count: Arc<AtomicUsize>,
}

impl Module for RefreshCountingModule {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> ModuleCapabilities {
        let counter = Arc::clone(&self.refresh_count);
        let refresh: RefreshFn = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        ModuleCapabilities { refresh: Some(refresh) }
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            emit.emit(Segment::text(self.text));
            std::future::pending::<()>().await;
            #[allow(unreachable_code)]
            Ok(())
        })
    }
}
