//! Host traits: relay → web view and native UI boundary.
//!
//! `ScriptHost` is the only way callback invocations reach the script engine.
//! `NotificationSurface` shows toasts and alerts on behalf of the web view.

use crate::api::types::{RelayError, ToastRequest};

/// Script invocation failure. Logged by the dispatcher and never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError(pub String);

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution context owning the embedded script engine.
///
/// Owned by a single `DispatchWorker`, so calls never overlap.
pub trait ScriptHost: Send + 'static {
    /// Handle to the view hosting the script engine.
    type View;

    /// Look up the view. `None` if it is gone (navigated away, disposed).
    fn resolve_view(&self) -> Option<Self::View>;

    /// Run `script` in the view's script context.
    fn invoke(&self, view: &Self::View, script: &str) -> Result<(), ScriptError>;
}

/// Native toast and alert surfaces.
pub trait NotificationSurface: Send + Sync {
    fn show_toast(&self, toast: &ToastRequest) -> Result<(), RelayError>;

    fn show_alert(&self, title: &str, message: &str) -> Result<(), RelayError>;
}
