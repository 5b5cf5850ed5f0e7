//! Callback Dispatcher - delivers payloads to a named script callback.
//!
//! Producers (channel adapters, possibly on transport threads) serialize the
//! payload and enqueue an invocation. A single `DispatchWorker` drains the
//! queue and owns the `ScriptHost`, so invocations reach the script context
//! one at a time and in enqueue order.
//!
//! # Flow
//!
//! 1. Adapter calls `deliver()` with the channel's callback name and payload
//! 2. The payload is serialized to JSON on the adapter's context
//! 3. `callback(json)` is queued for the worker; `deliver()` returns immediately
//! 4. Worker resolves the view and invokes the script
//! 5. Missing view: silent drop. Script error: logged and swallowed.

use tokio::sync::mpsc;

use crate::api::types::CallbackPayload;
use crate::protocols::host::ScriptHost;

/// A queued script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Script function to call
    pub callback: String,
    /// Serialized argument
    pub argument: String,
}

impl Invocation {
    /// Script text for this invocation, e.g. `myCb({"uri":"..."})`
    pub fn script(&self) -> String {
        format!("{}({})", self.callback, self.argument)
    }
}

/// Wrap `script` so an exception it raises is logged to the view's console
/// instead of escaping to the host.
pub fn guard_script(script: &str) -> String {
    format!("try {{ {script} }} catch (e) {{ console.error('Exception in push callback:', e); }}")
}

/// What happened to a single invocation on the worker side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The view was not resolvable; dropped silently
    ViewUnavailable,
    /// The script raised; logged and swallowed
    ScriptFailed,
}

/// Producer handle to the dispatch queue.
#[derive(Clone)]
pub struct CallbackDispatcher {
    tx: mpsc::UnboundedSender<Invocation>,
}

impl CallbackDispatcher {
    /// Create a dispatcher and the worker that must be spawned on the
    /// script host's execution context.
    pub fn new<H: ScriptHost>(host: H) -> (Self, DispatchWorker<H>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DispatchWorker { host, rx })
    }

    /// Queue `payload` for `callback`. Fire-and-forget.
    ///
    /// Without a callback name the payload has nowhere to go and is dropped.
    pub fn deliver(&self, callback: Option<&str>, payload: &CallbackPayload) {
        let Some(callback) = callback else {
            log::debug!("No callback registered, dropping payload: {payload:?}");
            return;
        };

        let argument = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize callback payload: {e} (callback={callback})");
                return;
            }
        };

        let invocation = Invocation {
            callback: callback.to_string(),
            argument,
        };

        if self.tx.send(invocation).is_err() {
            log::warn!("Dispatch worker stopped, dropping invocation: callback={callback}");
        }
    }
}

/// Single consumer of the dispatch queue.
pub struct DispatchWorker<H: ScriptHost> {
    host: H,
    rx: mpsc::UnboundedReceiver<Invocation>,
}

impl<H: ScriptHost> DispatchWorker<H> {
    /// Drain the queue until every `CallbackDispatcher` is dropped.
    pub async fn run(mut self) {
        log::debug!("Dispatch worker started");
        while let Some(invocation) = self.rx.recv().await {
            self.execute(&invocation);
        }
        log::debug!("Dispatch worker stopped");
    }

    /// Run one invocation against the host.
    pub fn execute(&self, invocation: &Invocation) -> DeliveryOutcome {
        let Some(view) = self.host.resolve_view() else {
            log::debug!(
                "Script view unavailable, dropping invocation: callback={}",
                invocation.callback
            );
            return DeliveryOutcome::ViewUnavailable;
        };

        match self.host.invoke(&view, &invocation.script()) {
            Ok(()) => {
                log::debug!("Invoked script callback: callback={}", invocation.callback);
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                log::error!(
                    "Exception in script callback: {} (callback={})",
                    e,
                    invocation.callback
                );
                DeliveryOutcome::ScriptFailed
            }
        }
    }
}
