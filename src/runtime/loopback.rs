//! In-process push transport.
//!
//! `LoopbackTransport` mints channel URIs locally and lets the owner inject
//! toast, raw and error events as if the push service had delivered them.
//! Hosts without a real push service use it together with `LoggingSurface`.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::types::{ChannelErrorKind, RelayError, ToastRequest, Value};
use crate::protocols::host::NotificationSurface;
use crate::protocols::transport::{ChannelEvent, EventSink, PushTransport};

/// Default base of minted channel URIs
pub const DEFAULT_BASE_URI: &str = "loopback://push";

/// Transport-side record of an opened channel.
struct LoopbackChannel {
    uri: String,
    sink: EventSink,
    toast_bound: bool,
    tile_bound: bool,
}

pub struct LoopbackTransport {
    base_uri: String,
    /// Opened channels keyed by name
    channels: Mutex<HashMap<String, LoopbackChannel>>,
    /// Total successful `open` calls
    opens: Mutex<usize>,
    /// Message for the next `open`, which then fails
    fail_next_open: Mutex<Option<String>>,
}

impl LoopbackTransport {
    pub fn new(base_uri: &str) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            channels: Mutex::new(HashMap::new()),
            opens: Mutex::new(0),
            fail_next_open: Mutex::new(None),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, LoopbackChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `open` fail with `message`.
    pub fn fail_next_open(&self, message: &str) {
        *self
            .fail_next_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    pub fn open_count(&self) -> usize {
        *self.opens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn uri(&self, channel_name: &str) -> Option<String> {
        self.channels().get(channel_name).map(|c| c.uri.clone())
    }

    /// Whether the channel is bound to both shell surfaces.
    pub fn is_bound(&self, channel_name: &str) -> bool {
        self.channels()
            .get(channel_name)
            .is_some_and(|c| c.toast_bound && c.tile_bound)
    }

    /// Deliver a toast notification. Returns `false` for an unknown channel.
    pub fn push_toast<I, K, V>(&self, channel_name: &str, collection: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let collection = collection
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.emit(channel_name, ChannelEvent::ToastReceived { collection })
    }

    /// Deliver a raw notification carrying `body`.
    pub fn push_raw(&self, channel_name: &str, body: impl Into<Vec<u8>>) -> bool {
        self.emit(
            channel_name,
            ChannelEvent::RawReceived {
                body: Box::new(Cursor::new(body.into())),
            },
        )
    }

    /// Raise a channel fault.
    pub fn push_error(&self, channel_name: &str, kind: ChannelErrorKind, message: &str) -> bool {
        self.emit(
            channel_name,
            ChannelEvent::ErrorOccurred {
                kind,
                message: message.to_string(),
            },
        )
    }

    fn emit(&self, channel_name: &str, event: ChannelEvent) -> bool {
        let sink = match self.channels().get(channel_name) {
            Some(channel) => channel.sink.clone(),
            None => {
                log::warn!("Loopback push to unknown channel: channel={channel_name}");
                return false;
            }
        };
        sink.emit(event)
    }

    fn bind(
        &self,
        channel_name: &str,
        mark: impl FnOnce(&mut LoopbackChannel),
    ) -> Result<(), RelayError> {
        match self.channels().get_mut(channel_name) {
            Some(channel) => {
                mark(channel);
                Ok(())
            }
            None => Err(RelayError::ChannelError {
                code: ChannelErrorKind::Unknown.to_string(),
                message: format!("Channel not open: {channel_name}"),
            }),
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URI)
    }
}

#[async_trait]
impl PushTransport for LoopbackTransport {
    async fn open(&self, channel_name: &str, events: EventSink) -> Result<(), RelayError> {
        let failure = self
            .fail_next_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(message) = failure {
            return Err(RelayError::ChannelError {
                code: ChannelErrorKind::ChannelOpenFailed.to_string(),
                message,
            });
        }

        let uri = format!("{}/{}", self.base_uri, Uuid::new_v4());
        log::debug!("Loopback channel opened: channel={channel_name}, uri={uri}");

        self.channels().insert(
            channel_name.to_string(),
            LoopbackChannel {
                uri: uri.clone(),
                sink: events.clone(),
                toast_bound: false,
                tile_bound: false,
            },
        );
        *self.opens.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        events.emit(ChannelEvent::UriUpdated { uri });
        Ok(())
    }

    async fn bind_to_shell_toast(&self, channel_name: &str) -> Result<(), RelayError> {
        self.bind(channel_name, |channel| channel.toast_bound = true)
    }

    async fn bind_to_shell_tile(&self, channel_name: &str) -> Result<(), RelayError> {
        self.bind(channel_name, |channel| channel.tile_bound = true)
    }
}

/// Notification surface that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSurface;

impl NotificationSurface for LoggingSurface {
    fn show_toast(&self, toast: &ToastRequest) -> Result<(), RelayError> {
        log::info!("Toast: title={}, content={}", toast.title, toast.content);
        Ok(())
    }

    fn show_alert(&self, title: &str, message: &str) -> Result<(), RelayError> {
        log::info!("Alert: title={title}, message={message}");
        Ok(())
    }
}
