//! Channel registry for managing push channels within a relay.
//!
//! This module provides:
//! - `PushChannel`: one named channel, its URI and its event stream
//! - `ChannelRegistry`: the keyed store guaranteeing one channel per name
//!
//! Channels are created on first registration and live for the relay's
//! lifetime, unless opening them fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, Mutex, RwLock};

use crate::api::types::{ChannelName, RegisterResult};
use crate::protocols::transport::{ChannelEvent, EventSink};

/// Lifecycle of a channel that exists in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLifecycle {
    /// Open requested, no URI yet
    Opening,
    /// URI assigned
    Open,
    /// URI assigned and bound to the toast and tile surfaces
    Bound,
}

/// A named push channel.
///
/// Thread-safe: shared as `Arc<PushChannel>` between the registry, the relay
/// and the channel's event adapter.
pub struct PushChannel {
    /// Channel name, unique within the registry
    name: ChannelName,
    /// Assigned once by the first URI update
    uri: OnceLock<String>,
    /// Set after both shell surfaces are bound
    bound: AtomicBool,
    /// Script callback receiving this channel's payloads
    callback: RwLock<Option<String>>,
    /// Receiving half, taken by the first adapter that hooks the channel
    events: Mutex<Option<mpsc::UnboundedReceiver<ChannelEvent>>>,
}

impl PushChannel {
    /// Create a channel and the sending half of its event stream.
    ///
    /// The channel keeps only the receiving half. Once every clone of the
    /// sink is dropped, the channel's adapter ends and releases the channel.
    fn new(name: ChannelName, callback: Option<String>) -> (Arc<Self>, EventSink) {
        let (sink, events) = EventSink::new(&name);
        let channel = Arc::new(Self {
            name,
            uri: OnceLock::new(),
            bound: AtomicBool::new(false),
            callback: RwLock::new(callback),
            events: Mutex::new(Some(events)),
        });
        (channel, sink)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel URI, once assigned.
    pub fn uri(&self) -> Option<&str> {
        self.uri.get().map(String::as_str)
    }

    /// Assign the channel URI and return the URI the channel keeps.
    ///
    /// The first assignment wins for the channel's lifetime.
    pub fn assign_uri(&self, uri: String) -> &str {
        let assigned = self.uri.get_or_init(|| uri.clone());
        if *assigned != uri {
            log::warn!(
                "Ignoring URI change on open channel: channel={}, kept={}, offered={}",
                self.name,
                assigned,
                uri
            );
        }
        assigned
    }

    pub fn lifecycle(&self) -> ChannelLifecycle {
        match (self.uri.get(), self.bound.load(Ordering::Acquire)) {
            (None, _) => ChannelLifecycle::Opening,
            (Some(_), false) => ChannelLifecycle::Open,
            (Some(_), true) => ChannelLifecycle::Bound,
        }
    }

    pub(crate) fn mark_bound(&self) {
        self.bound.store(true, Ordering::Release);
    }

    pub async fn callback(&self) -> Option<String> {
        self.callback.read().await.clone()
    }

    pub(crate) async fn set_callback(&self, callback: String) {
        *self.callback.write().await = Some(callback);
    }

    /// Take the event stream. Only the first caller gets it.
    pub(crate) async fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        self.events.lock().await.take()
    }

    /// Registration result for this channel, if its URI is known.
    pub fn register_result(&self) -> Option<RegisterResult> {
        self.uri().map(|uri| RegisterResult {
            uri: uri.to_string(),
            channel_name: self.name.clone(),
        })
    }
}

/// Keyed store of channels.
///
/// Thread-safe: Uses tokio::sync::Mutex for concurrent access.
pub struct ChannelRegistry {
    /// Map of channel name to channel
    channels: Mutex<HashMap<ChannelName, Arc<PushChannel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a channel or create it.
    ///
    /// A provided `callback` replaces the callback of an existing channel;
    /// `None` keeps it.
    ///
    /// # Returns
    /// The channel, and the sink of its event stream if it was created by
    /// this call. The caller hands that sink to the transport.
    pub async fn get_or_create(
        &self,
        name: &str,
        callback: Option<String>,
    ) -> (Arc<PushChannel>, Option<EventSink>) {
        let mut channels = self.channels.lock().await;

        if let Some(channel) = channels.get(name) {
            if let Some(callback) = callback {
                channel.set_callback(callback).await;
            }
            return (channel.clone(), None);
        }

        let (channel, sink) = PushChannel::new(name.to_string(), callback);
        channels.insert(name.to_string(), channel.clone());
        log::info!(
            "Channel created: channel={name}, total_channels={}",
            channels.len()
        );
        (channel, Some(sink))
    }

    pub async fn get(&self, name: &str) -> Option<Arc<PushChannel>> {
        self.channels.lock().await.get(name).cloned()
    }

    /// Remove `channel`, unless its name now maps to a different channel.
    pub async fn remove(&self, channel: &Arc<PushChannel>) -> bool {
        let mut channels = self.channels.lock().await;
        let is_current = channels
            .get(channel.name())
            .is_some_and(|current| Arc::ptr_eq(current, channel));
        if !is_current {
            return false;
        }

        channels.remove(channel.name());
        log::info!("Channel removed: channel={}", channel.name());
        true
    }

    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
