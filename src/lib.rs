//! Push notification relay for web views.
//!
//! Registers named push channels with a host transport, normalizes channel
//! events into JSON payloads and invokes a named script callback inside a web
//! view. Enable the `tauri` feature for the Tauri plugin.

pub mod api;
pub mod commands;
pub mod config;
#[cfg(feature = "tauri")]
mod plugin;
pub mod protocols;
pub mod runtime;

pub use api::types::{
    CallbackPayload, NotificationRecord, RegisterError, RegisterResult, RegistrationOptions,
    RelayError, ToastRequest, Value,
};
pub use config::PushConfig;
#[cfg(feature = "tauri")]
pub use plugin::{export_bindings, init, specta_builder, PLUGIN_NAME};
pub use runtime::dispatcher::{CallbackDispatcher, DispatchWorker};
pub use runtime::loopback::{LoggingSurface, LoopbackTransport};
pub use runtime::relay::PushRelay;
