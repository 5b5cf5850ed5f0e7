//! Tauri plugin wiring.
//!
//! Registers the push commands under `plugin:push-relay|...`, reads
//! `PushConfig` from `plugins.push-relay` in `tauri.conf.json`, starts the
//! dispatch worker and manages an `Arc<PushRelay>`.

use std::path::Path;
use std::sync::Arc;

use specta_typescript::Typescript;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime};

use crate::commands::push::{register, show_raw_notification, show_toast_notification};
use crate::config::PushConfig;
use crate::protocols::transport::PushTransport;
use crate::runtime::dispatcher::CallbackDispatcher;
use crate::runtime::relay::PushRelay;
use crate::runtime::webview_host::{ShellSurface, WebviewScriptHost};

pub const PLUGIN_NAME: &str = "push-relay";

/// Command collection shared by the invoke handler and the binding export.
pub fn specta_builder<R: Runtime>() -> tauri_specta::Builder<R> {
    tauri_specta::Builder::<R>::new()
        .plugin_name(PLUGIN_NAME)
        .commands(tauri_specta::collect_commands![
            register,
            show_toast_notification,
            show_raw_notification
        ])
}

/// Write TypeScript bindings for the push commands to `path`.
pub fn export_bindings(path: impl AsRef<Path>) -> Result<(), String> {
    specta_builder::<tauri::Wry>()
        .export(Typescript::default(), path.as_ref())
        .map_err(|e| format!("Failed to export push bindings: {e}"))
}

/// Build the plugin around the host's push transport.
pub fn init<R: Runtime>(transport: Arc<dyn PushTransport>) -> TauriPlugin<R, Option<PushConfig>> {
    let builder = specta_builder::<R>();

    Builder::<R, Option<PushConfig>>::new(PLUGIN_NAME)
        .invoke_handler(builder.invoke_handler())
        .setup(move |app, api| {
            let config = api.config().clone().unwrap_or_default();
            log::info!(
                "Push relay plugin starting: webview={}, bind_shell_surfaces={}",
                config.webview_label,
                config.bind_shell_surfaces
            );

            let host = WebviewScriptHost::new(app.clone(), config.webview_label.clone());
            let (dispatcher, worker) = CallbackDispatcher::new(host);
            tauri::async_runtime::spawn(worker.run());

            let surface = Arc::new(ShellSurface::new(app.clone()));
            app.manage(Arc::new(PushRelay::new(
                transport, surface, dispatcher, config,
            )));
            Ok(())
        })
        .build()
}
