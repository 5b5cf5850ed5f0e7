//! Runtime modules for channel management and callback delivery.
//!
//! The runtime domain handles relay-level concepts: channels, their event
//! streams, and the queue into the script context.

pub mod channels;
pub mod dispatcher;
pub mod events;
pub mod loopback;
pub mod relay;
#[cfg(feature = "tauri")]
pub mod webview_host;
