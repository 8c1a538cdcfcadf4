// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bar host (§4.H): owns stdio, the module set, and the click-routing
//! fabric that stitches every module's last output into one i3bar frame.
//! `run` consumes the host by value — the redesign note in spec.md §9 calls
//! for an opaque handle whose constructor is separate from the call that
//! drives the loop, rather than a true process-wide global.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{ClickDecoder, Encoder, Header};
use crate::error::HostError;
use crate::event::{ClickEvent, BUTTON_RIGHT};
use crate::module::Module;
use crate::module_set::ModuleSet;
use crate::segment::ClickHandler;
use crate::timing::Timing;

/// Conventional Linux signal numbers for SIGUSR1 / SIGUSR2 (§6). The header
/// reports whatever is actually installed; these are the defaults.
pub const DEFAULT_STOP_SIGNAL: i32 = 10;
pub const DEFAULT_CONT_SIGNAL: i32 = 12;

/// Invoked on right-click of an error segment (§4.H); receives the error
/// message and the click event. The default spawns an external dialog.
pub type ErrorHandler = Arc<dyn Fn(&str, ClickEvent) + Send + Sync>;

fn default_error_handler() -> ErrorHandler {
    Arc::new(|message, _event| {
        // Fire-and-forget: a missing `xmessage` binary is not a host error.
        match std::process::Command::new("xmessage").arg(message).spawn() {
            Ok(_) => {}
            Err(err) => warn!(%err, "failed to spawn error dialog"),
        }
    })
}

/// What a host-assigned click-table entry does with an incoming click (§4.H
/// `print`): an ordinary segment just invokes its own handler, an error
/// segment routes right-click to the configured error handler and any other
/// button to the segment's own handler (if it has one).
enum ClickRoute {
    Plain(ClickHandler),
    Error { message: String, other: Option<ClickHandler> },
}

impl ClickRoute {
    fn dispatch(&self, event: ClickEvent, error_handler: &ErrorHandler) {
        match self {
            ClickRoute::Plain(handler) => handler(event),
            ClickRoute::Error { message, other } => {
                if event.button == BUTTON_RIGHT {
                    error_handler(message, event);
                } else if let Some(handler) = other {
                    handler(event);
                }
            }
        }
    }
}

/// The bar host (§4.H): the only public entry point into the runtime.
pub struct BarHost {
    modules: Vec<Arc<dyn Module>>,
    timing: Timing,
    suppress_signals: bool,
    stop_signal: i32,
    cont_signal: i32,
    error_handler: ErrorHandler,
}

impl Default for BarHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BarHost {
    /// A fresh host using the process-wide real-clock [`Timing`] singleton.
    pub fn new() -> Self {
        Self::with_timing(Timing::global())
    }

    /// A fresh host bound to a specific [`Timing`] — the hook tests use to
    /// run the whole loop in virtual time (§8).
    pub fn with_timing(timing: Timing) -> Self {
        BarHost {
            modules: Vec::new(),
            timing,
            suppress_signals: false,
            stop_signal: DEFAULT_STOP_SIGNAL,
            cont_signal: DEFAULT_CONT_SIGNAL,
            error_handler: default_error_handler(),
        }
    }

    /// Register a module before `run`. Registering modules once `run` has
    /// begun is a programming error, not a runtime one (§7); since `run`
    /// consumes `self`, that misuse is rejected at compile time rather than
    /// by a runtime flag.
    pub fn add(&mut self, module: Arc<dyn Module>) -> &mut Self {
        self.modules.push(module);
        self
    }

    /// Suppress SIGUSR1/SIGUSR2 handling and omit the corresponding header
    /// fields (§4.H, §6). Must be called before `run`.
    pub fn suppress_signals(&mut self, suppress: bool) -> &mut Self {
        self.suppress_signals = suppress;
        self
    }

    /// Override the numeric signals used for pause/resume (§6). Must be
    /// called before `run`.
    pub fn set_signals(&mut self, stop_signal: i32, cont_signal: i32) -> &mut Self {
        self.stop_signal = stop_signal;
        self.cont_signal = cont_signal;
        self
    }

    /// Install a custom error handler, invoked on right-click of an error
    /// segment (§4.H). Must be called before `run`.
    pub fn set_error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&str, ClickEvent) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Register additional modules and enter the main loop over real stdio
    /// (§4.H). Returns once stdin/stdout error or the reader hits EOF.
    pub async fn run(self, modules: impl IntoIterator<Item = Arc<dyn Module>>) -> Result<(), HostError> {
        self.run_io(tokio::io::stdin(), tokio::io::stdout(), modules).await
    }

    /// The same main loop as [`run`], but over caller-supplied stdio
    /// substitutes — what the integration tests use to drive the host over
    /// an in-memory duplex pipe instead of real stdio.
    pub async fn run_io<R, W>(
        mut self,
        reader: R,
        writer: W,
        modules: impl IntoIterator<Item = Arc<dyn Module>>,
    ) -> Result<(), HostError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        self.modules.extend(modules);

        let header = Header {
            stop_signal: (!self.suppress_signals).then_some(self.stop_signal),
            cont_signal: (!self.suppress_signals).then_some(self.cont_signal),
        };
        let mut encoder = Encoder::new(writer);
        encoder.write_header(&header).await?;
        info!(modules = self.modules.len(), "bar host started");

        // Cancelled when `run_io` returns by any path (guard's `Drop`), so
        // every module's background tasks and the click-reader task exit
        // instead of outliving the host as orphaned tokio tasks (SPEC_FULL
        // §2.4).
        let shutdown = CancellationToken::new();
        let _shutdown_guard = CancelOnDrop(shutdown.clone());

        let mut module_set = ModuleSet::new_with_shutdown(self.timing.clone(), shutdown.clone());
        for module in std::mem::take(&mut self.modules) {
            module_set.add(module);
        }

        let (click_tx, mut click_rx) = tokio::sync::mpsc::unbounded_channel::<ClickChannelItem>();
        let click_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut decoder = ClickDecoder::new(reader);
            loop {
                let item = tokio::select! {
                    _ = click_shutdown.cancelled() => break,
                    result = decoder.next_event() => match result {
                        Ok(Some(frame)) => ClickChannelItem::Event(frame),
                        Ok(None) => ClickChannelItem::Eof,
                        Err(err) => ClickChannelItem::Err(err),
                    },
                };
                let is_terminal = matches!(item, ClickChannelItem::Eof | ClickChannelItem::Err(_));
                if click_tx.send(item).is_err() || is_terminal {
                    break;
                }
            }
        });

        let mut signals = SignalWatch::install(self.suppress_signals);

        let mut click_table: HashMap<String, ClickRoute> = HashMap::new();
        // "The bar starts paused, so initial resume triggers the first
        // emission path" (§4.H step 3): nothing has produced output yet, so
        // that resume is a no-op and the host enters the loop already
        // running — the first real frame comes from the first update event
        // below, same as any subsequent one.
        let mut paused = false;
        let mut dirty_on_resume = false;

        loop {
            tokio::select! {
                biased;

                index = module_set.update_stream() => {
                    let Some(index) = index else { break };
                    debug!(index, "module output changed");
                    if paused {
                        dirty_on_resume = true;
                    } else {
                        emit_frame(&mut encoder, &module_set, &mut click_table).await?;
                    }
                }

                frame = click_rx.recv() => {
                    match frame {
                        Some(ClickChannelItem::Event(frame)) => {
                            dispatch_click(&click_table, frame, &self.error_handler);
                        }
                        Some(ClickChannelItem::Eof) => break,
                        Some(ClickChannelItem::Err(err)) => return Err(err),
                        None => break,
                    }
                }

                _ = signals.pause(), if !paused => {
                    paused = true;
                    self.timing.pause();
                    info!("bar host paused");
                }

                _ = signals.resume(), if paused => {
                    paused = false;
                    self.timing.resume();
                    info!("bar host resumed");
                    if dirty_on_resume {
                        dirty_on_resume = false;
                        emit_frame(&mut encoder, &module_set, &mut click_table).await?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Cancels its token when dropped, regardless of which `return`/`break` path
/// out of `run_io` runs — the cooperative-shutdown signal for every module's
/// background tasks and the click-reader task (SPEC_FULL §2.4).
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

enum ClickChannelItem {
    Event(crate::event::ClickFrame),
    Eof,
    Err(HostError),
}

fn dispatch_click(table: &HashMap<String, ClickRoute>, frame: crate::event::ClickFrame, error_handler: &ErrorHandler) {
    let Some(name) = frame.name else { return };
    let Some(route) = table.get(&name) else { return };
    route.dispatch(frame.event, error_handler);
}

/// The `print` algorithm (§4.H): rebuild the click table from the current
/// `last_outputs()` and write one JSON array of every module's segments.
async fn emit_frame<W: AsyncWrite + Unpin>(
    encoder: &mut Encoder<W>,
    module_set: &ModuleSet,
    click_table: &mut HashMap<String, ClickRoute>,
) -> Result<(), HostError> {
    let outputs = module_set.last_outputs();
    let mut new_table = HashMap::new();
    let mut wire_items = Vec::new();
    let mut error_id = 0usize;

    for (idx, segments) in outputs.into_iter().enumerate() {
        for seg in segments {
            let name = if seg.is_error() {
                let name = format!("e/{error_id}/{idx}");
                error_id += 1;
                new_table.insert(
                    name.clone(),
                    ClickRoute::Error {
                        message: seg.error().unwrap_or_default().to_owned(),
                        other: seg.click_handler(),
                    },
                );
                name
            } else {
                let name = format!("m/{idx}");
                if let Some(handler) = seg.click_handler() {
                    new_table.insert(name.clone(), ClickRoute::Plain(handler));
                }
                name
            };
            wire_items.push((seg, Some(name)));
        }
    }

    *click_table = new_table;
    encoder.write_update(&wire_items).await
}

/// Wraps the two signal streams the host listens on, or a pair of
/// never-completing futures when signals are suppressed (§4.H).
struct SignalWatch {
    #[cfg(unix)]
    pause: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    resume: Option<tokio::signal::unix::Signal>,
}

impl SignalWatch {
    #[cfg(unix)]
    fn install(suppress: bool) -> Self {
        if suppress {
            return SignalWatch { pause: None, resume: None };
        }
        let pause = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1()).ok();
        let resume = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined2()).ok();
        SignalWatch { pause, resume }
    }

    #[cfg(not(unix))]
    fn install(_suppress: bool) -> Self {
        SignalWatch {}
    }

    #[cfg(unix)]
    async fn pause(&mut self) {
        match &mut self.pause {
            Some(sig) => {
                sig.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    #[cfg(not(unix))]
    async fn pause(&mut self) {
        std::future::pending::<()>().await
    }

    #[cfg(unix)]
    async fn resume(&mut self) {
        match &mut self.resume {
            Some(sig) => {
                sig.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    #[cfg(not(unix))]
    async fn resume(&mut self) {
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
