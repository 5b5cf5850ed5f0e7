//! Relay configuration.
//!
//! With the `tauri` feature this is read from the `plugins.push-relay`
//! section of `tauri.conf.json`; every field has a default.

use serde::Deserialize;

/// Default label of the web view that receives callbacks
pub const DEFAULT_WEBVIEW_LABEL: &str = "main";

/// Default title of the alert shown by `showRawNotification`
pub const DEFAULT_ALERT_TITLE: &str = "Push Notification";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushConfig {
    /// Label of the web view whose script context runs the callbacks
    pub webview_label: String,
    /// Title of the native alert used for raw notifications
    pub alert_title: String,
    /// Bind newly opened channels to the toast and tile shell surfaces
    pub bind_shell_surfaces: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            webview_label: DEFAULT_WEBVIEW_LABEL.to_string(),
            alert_title: DEFAULT_ALERT_TITLE.to_string(),
            bind_shell_surfaces: true,
        }
    }
}
