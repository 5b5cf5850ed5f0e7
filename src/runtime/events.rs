//! Event Adapter - turns channel events into callback payloads.
//!
//! Each channel gets exactly one adapter task, started when the channel is
//! hooked. The task owns the channel's event receiver, so hooking a channel
//! twice can never make one event reach the callback twice.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::api::types::{CallbackPayload, NotificationRecord, RegisterError};
use crate::protocols::transport::{ChannelEvent, RawBody};
use crate::runtime::channels::PushChannel;
use crate::runtime::dispatcher::CallbackDispatcher;

/// Attach event hooks to `channel`.
///
/// Idempotent: only the first call starts an adapter.
///
/// # Returns
/// `true` if this call attached the hooks
pub async fn attach_hooks(channel: &Arc<PushChannel>, dispatcher: &CallbackDispatcher) -> bool {
    let Some(events) = channel.take_events().await else {
        log::debug!("Channel already hooked: channel={}", channel.name());
        return false;
    };

    let adapter = EventAdapter {
        channel: channel.clone(),
        dispatcher: dispatcher.clone(),
    };
    tokio::spawn(adapter.run(events));

    log::debug!("Channel hooked: channel={}", channel.name());
    true
}

/// Per-channel event loop.
pub struct EventAdapter {
    channel: Arc<PushChannel>,
    dispatcher: CallbackDispatcher,
}

impl EventAdapter {
    /// Handle events in arrival order until every sink of the channel is
    /// dropped. The adapter's hold on the channel ends with it.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<ChannelEvent>) {
        while let Some(event) = events.recv().await {
            if let Some(payload) = self.adapt(event).await {
                let callback = self.channel.callback().await;
                self.dispatcher.deliver(callback.as_deref(), &payload);
            }
        }
        log::debug!("Channel event stream closed: channel={}", self.channel.name());
    }

    /// Normalize one event. `None` means the event produced nothing to deliver.
    async fn adapt(&self, event: ChannelEvent) -> Option<CallbackPayload> {
        let channel = self.channel.name();
        match event {
            ChannelEvent::UriUpdated { uri } => {
                let uri = self.channel.assign_uri(uri);
                log::info!("Channel URI updated: channel={channel}, uri={uri}");
                self.channel.register_result().map(CallbackPayload::from)
            }
            ChannelEvent::ErrorOccurred { kind, message } => {
                log::warn!("Channel error: channel={channel}, code={kind}, message={message}");
                Some(
                    RegisterError {
                        code: kind.to_string(),
                        message,
                    }
                    .into(),
                )
            }
            ChannelEvent::ToastReceived { collection } => {
                log::debug!(
                    "Toast notification received: channel={channel}, entries={}",
                    collection.len()
                );
                Some(NotificationRecord::toast(collection).into())
            }
            ChannelEvent::RawReceived { body } => match read_body(body).await {
                Ok(text) => {
                    log::debug!(
                        "Raw notification received: channel={channel}, bytes={}",
                        text.len()
                    );
                    Some(NotificationRecord::raw(text).into())
                }
                Err(e) => {
                    log::warn!("Failed to read raw notification body: {e} (channel={channel})");
                    None
                }
            },
        }
    }
}

/// Read a raw notification body to the end. The body is dropped on return.
async fn read_body(mut body: RawBody) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes).await?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("Raw notification body is not valid UTF-8, replacing invalid sequences");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
