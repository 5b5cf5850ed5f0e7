//! Push commands for the web view.
//!
//! Every command takes a JSON-encoded argument list whose first element is
//! the payload, e.g. `["{\"channelName\":\"MyChannel\",\"ecb\":\"onPush\"}"]`.
//! A malformed list or payload aborts the command before any side effect.

#[cfg(feature = "tauri")]
use std::sync::Arc;

#[cfg(feature = "tauri")]
use tauri::State;

use crate::api::types::{RegisterResult, RegistrationOptions, RelayError, ToastRequest};
use crate::runtime::relay::PushRelay;

/// Extract the payload from a JSON-encoded argument list.
///
/// A string element is returned as is; any other JSON element is returned as
/// its JSON text.
///
/// # Errors
/// * `RelayError::ParseError` - Not a JSON array, or an empty one
pub fn first_argument(args: &str) -> Result<String, RelayError> {
    let list: Vec<serde_json::Value> =
        serde_json::from_str(args).map_err(|e| RelayError::ParseError {
            message: format!("Invalid argument list: {e}"),
        })?;

    match list.into_iter().next() {
        Some(serde_json::Value::String(payload)) => Ok(payload),
        Some(other) => Ok(other.to_string()),
        None => Err(RelayError::ParseError {
            message: "Argument list is empty".to_string(),
        }),
    }
}

/// Inner function for testing without Tauri State wrapper.
pub async fn register_inner(
    relay: &PushRelay,
    args: &str,
) -> Result<Option<RegisterResult>, RelayError> {
    let options = RegistrationOptions::from_json(&first_argument(args)?)?;
    log::info!(
        "register: channel={}, callback={:?}",
        options.channel_name,
        options.callback_name
    );
    Ok(relay.register(options).await)
}

pub fn show_toast_notification_inner(relay: &PushRelay, args: &str) -> Result<(), RelayError> {
    let payload = first_argument(args)?;
    let toast: ToastRequest = serde_json::from_str(&payload).map_err(|e| RelayError::ParseError {
        message: format!("Invalid toast: {e}"),
    })?;
    log::debug!("show_toast_notification: title={}", toast.title);
    relay.show_toast_notification(&toast);
    Ok(())
}

pub fn show_raw_notification_inner(relay: &PushRelay, args: &str) -> Result<(), RelayError> {
    let message = first_argument(args)?;
    log::debug!("show_raw_notification: bytes={}", message.len());
    relay.show_raw_notification(&message);
    Ok(())
}

/// Register a push channel.
///
/// # Arguments
/// * `args` - Argument list; the first element holds `{channelName, ecb?}`
///
/// # Returns
/// * `Some(RegisterResult)` - The channel already existed; its current URI
/// * `None` - The channel is being opened; `{uri, channel}` or
///   `{code, message}` arrives through the `ecb` callback
///
/// # Errors
/// * `RelayError::ParseError` - Malformed argument list or options
#[cfg(feature = "tauri")]
#[tauri::command]
#[specta::specta]
pub async fn register(
    relay: State<'_, Arc<PushRelay>>,
    args: String,
) -> Result<Option<RegisterResult>, RelayError> {
    register_inner(&relay, &args).await
}

/// Show a native toast built from `{title, content, navigationUri?}`.
///
/// Fire-and-forget: only parse errors are returned.
#[cfg(feature = "tauri")]
#[tauri::command]
#[specta::specta]
pub fn show_toast_notification(
    relay: State<'_, Arc<PushRelay>>,
    args: String,
) -> Result<(), RelayError> {
    show_toast_notification_inner(&relay, &args)
}

/// Show raw notification text in a native alert.
///
/// Fire-and-forget: only parse errors are returned.
#[cfg(feature = "tauri")]
#[tauri::command]
#[specta::specta]
pub fn show_raw_notification(
    relay: State<'_, Arc<PushRelay>>,
    args: String,
) -> Result<(), RelayError> {
    show_raw_notification_inner(&relay, &args)
}
