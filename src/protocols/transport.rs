//! PushTransport trait: relay → OS push service abstraction boundary.
//!
//! The transport owns the actual channel plumbing. The relay only asks it to
//! open and bind channels, and receives lifecycle and delivery events back
//! through an `EventSink`.

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::api::types::{ChannelErrorKind, RelayError, Value};

/// Body stream of a raw notification, owned by the event that carries it.
pub type RawBody = Box<dyn AsyncRead + Send + Unpin>;

/// Event raised by a push channel.
pub enum ChannelEvent {
    /// The channel was assigned its URI
    UriUpdated { uri: String },
    /// The channel faulted
    ErrorOccurred {
        kind: ChannelErrorKind,
        message: String,
    },
    /// A toast notification arrived; the collection may repeat keys
    ToastReceived { collection: Vec<(String, Value)> },
    /// A raw notification arrived
    RawReceived { body: RawBody },
}

impl std::fmt::Debug for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelEvent::UriUpdated { uri } => {
                f.debug_struct("UriUpdated").field("uri", uri).finish()
            }
            ChannelEvent::ErrorOccurred { kind, message } => f
                .debug_struct("ErrorOccurred")
                .field("kind", kind)
                .field("message", message)
                .finish(),
            ChannelEvent::ToastReceived { collection } => f
                .debug_struct("ToastReceived")
                .field("collection", collection)
                .finish(),
            ChannelEvent::RawReceived { .. } => {
                f.debug_struct("RawReceived").finish_non_exhaustive()
            }
        }
    }
}

/// Sending half of a channel's event stream.
///
/// Cheap to clone and callable from any thread, including transport threads
/// that are not part of the async runtime.
#[derive(Clone, Debug)]
pub struct EventSink {
    channel_name: String,
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl EventSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new(channel_name: &str) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                channel_name: channel_name.to_string(),
                tx,
            },
            rx,
        )
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Push an event to the channel's adapter.
    ///
    /// Returns `false` if nobody listens anymore; the event is dropped.
    pub fn emit(&self, event: ChannelEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Dropping channel event, adapter gone: channel={}, event={:?}",
                    self.channel_name,
                    e.0
                );
                false
            }
        }
    }
}

/// Abstract interface to the host push service.
///
/// `open` must report the channel URI through `events` (as
/// `ChannelEvent::UriUpdated`) rather than returning it, and keep using the
/// same sink for every later event of that channel. Dropping the sink ends
/// the channel's event stream. A failed `open` must not keep it.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a new channel. Events for it flow into `events`.
    async fn open(&self, channel_name: &str, events: EventSink) -> Result<(), RelayError>;

    /// Bind the channel to system toast surfaces.
    async fn bind_to_shell_toast(&self, channel_name: &str) -> Result<(), RelayError>;

    /// Bind the channel to system tile surfaces.
    async fn bind_to_shell_tile(&self, channel_name: &str) -> Result<(), RelayError>;
}
