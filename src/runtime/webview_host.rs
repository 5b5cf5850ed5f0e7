//! Tauri implementations of the host traits.
//!
//! `WebviewScriptHost` runs callback scripts in a labeled web view window.
//! `ShellSurface` shows toasts through `tauri-plugin-notification` and alerts
//! through `tauri-plugin-dialog`; the app must register both plugins.

use tauri::{AppHandle, Manager, Runtime, WebviewWindow};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_notification::NotificationExt;

use crate::api::types::{RelayError, ToastRequest};
use crate::protocols::host::{NotificationSurface, ScriptError, ScriptHost};
use crate::runtime::dispatcher::guard_script;

/// Script host backed by a Tauri web view window.
pub struct WebviewScriptHost<R: Runtime> {
    /// Tauri application handle for window lookup
    app: AppHandle<R>,
    /// Label of the window whose web view runs the callbacks
    label: String,
}

impl<R: Runtime> WebviewScriptHost<R> {
    pub fn new(app: AppHandle<R>, label: String) -> Self {
        Self { app, label }
    }
}

impl<R: Runtime> ScriptHost for WebviewScriptHost<R> {
    type View = WebviewWindow<R>;

    fn resolve_view(&self) -> Option<WebviewWindow<R>> {
        self.app.get_webview_window(&self.label)
    }

    fn invoke(&self, view: &WebviewWindow<R>, script: &str) -> Result<(), ScriptError> {
        // eval schedules the script on the web view's own thread and only
        // reports scheduling failures, so script exceptions go to the console
        view.eval(&guard_script(script))
            .map_err(|e| ScriptError(format!("eval failed in window {}: {e}", self.label)))
    }
}

/// Native toast and alert surfaces of the Tauri app.
pub struct ShellSurface<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> ShellSurface<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> NotificationSurface for ShellSurface<R> {
    fn show_toast(&self, toast: &ToastRequest) -> Result<(), RelayError> {
        if let Some(navigation_uri) = &toast.navigation_uri {
            log::debug!("Toast navigation target not supported, ignoring: {navigation_uri}");
        }

        self.app
            .notification()
            .builder()
            .title(&toast.title)
            .body(&toast.content)
            .show()
            .map_err(|e| RelayError::SurfaceError {
                message: format!("Failed to show toast: {e}"),
            })
    }

    fn show_alert(&self, title: &str, message: &str) -> Result<(), RelayError> {
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Info)
            .show(|_| {});
        Ok(())
    }
}
