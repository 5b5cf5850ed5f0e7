//! PushRelay - entry point for channel registration and notification display.
//!
//! Owns the channel registry, the transport, the native notification surface
//! and the producer side of the callback dispatcher. Injected into Tauri as
//! managed state by the plugin.

use std::sync::Arc;

use chrono::{Local, NaiveTime};

use crate::api::types::{ChannelErrorKind, RegisterResult, RegistrationOptions, ToastRequest};
use crate::config::PushConfig;
use crate::protocols::host::NotificationSurface;
use crate::protocols::transport::{ChannelEvent, EventSink, PushTransport};
use crate::runtime::channels::{ChannelRegistry, PushChannel};
use crate::runtime::dispatcher::CallbackDispatcher;
use crate::runtime::events::attach_hooks;

/// Text of the alert showing a raw notification received at `time`.
pub fn raw_alert_text(message: &str, time: NaiveTime) -> String {
    format!("Received Notification {}:\n{message}", time.format("%H:%M"))
}

pub struct PushRelay {
    /// Channels by name
    registry: ChannelRegistry,
    /// Host push service
    transport: Arc<dyn PushTransport>,
    /// Native toast/alert surfaces
    surface: Arc<dyn NotificationSurface>,
    /// Queue into the script context
    dispatcher: CallbackDispatcher,
    config: PushConfig,
}

impl PushRelay {
    /// Creates a new PushRelay.
    ///
    /// # Arguments
    /// * `transport` - Host push service
    /// * `surface` - Native toast/alert surfaces
    /// * `dispatcher` - Producer handle; its worker must be running on the
    ///   script context for callbacks to be delivered
    /// * `config` - Relay configuration
    pub fn new(
        transport: Arc<dyn PushTransport>,
        surface: Arc<dyn NotificationSurface>,
        dispatcher: CallbackDispatcher,
        config: PushConfig,
    ) -> Self {
        log::debug!("Initializing PushRelay: webview={}", config.webview_label);
        Self {
            registry: ChannelRegistry::new(),
            transport,
            surface,
            dispatcher,
            config,
        }
    }

    /// Register a channel, opening it if it does not exist yet.
    ///
    /// A new channel is hooked before it is opened, so its URI update cannot
    /// be missed. Its result reaches the callback asynchronously.
    ///
    /// # Returns
    /// * `Some(RegisterResult)` - The channel already existed and has a URI
    /// * `None` - The result will arrive through the callback
    pub async fn register(&self, options: RegistrationOptions) -> Option<RegisterResult> {
        let RegistrationOptions {
            channel_name,
            callback_name,
        } = options;

        let (channel, sink) = self
            .registry
            .get_or_create(&channel_name, callback_name)
            .await;

        attach_hooks(&channel, &self.dispatcher).await;

        let Some(sink) = sink else {
            let result = channel.register_result();
            log::info!(
                "Channel re-registered: channel={channel_name}, lifecycle={:?}",
                channel.lifecycle()
            );
            return result;
        };

        // The local sink is dropped on return, leaving the transport's clone
        log::info!("Opening channel: channel={channel_name}");
        if let Err(e) = self.transport.open(&channel_name, sink.clone()).await {
            log::error!("Failed to open channel: {e} (channel={channel_name})");
            sink.emit(ChannelEvent::ErrorOccurred {
                kind: ChannelErrorKind::ChannelOpenFailed,
                message: e.message().to_string(),
            });
            self.registry.remove(&channel).await;
            return None;
        }

        if self.config.bind_shell_surfaces {
            self.bind_shell_surfaces(&channel, &sink).await;
        }

        None
    }

    async fn bind_shell_surfaces(&self, channel: &PushChannel, sink: &EventSink) {
        let name = channel.name();
        let toast = self.transport.bind_to_shell_toast(name).await;
        let tile = self.transport.bind_to_shell_tile(name).await;

        match (toast, tile) {
            (Ok(()), Ok(())) => {
                channel.mark_bound();
                log::debug!("Channel bound to shell surfaces: channel={name}");
            }
            (toast, tile) => {
                for e in [toast.err(), tile.err()].into_iter().flatten() {
                    log::warn!("Failed to bind channel: {e} (channel={name})");
                    sink.emit(ChannelEvent::ErrorOccurred {
                        kind: ChannelErrorKind::Unknown,
                        message: e.message().to_string(),
                    });
                }
            }
        }
    }

    /// Show a native toast. Fire-and-forget: failures are logged.
    pub fn show_toast_notification(&self, toast: &ToastRequest) {
        if let Err(e) = self.surface.show_toast(toast) {
            log::error!("Failed to show toast notification: {e}");
        }
    }

    /// Show raw notification text in a native alert. Fire-and-forget.
    pub fn show_raw_notification(&self, message: &str) {
        let text = raw_alert_text(message, Local::now().time());
        if let Err(e) = self.surface.show_alert(&self.config.alert_title, &text) {
            log::error!("Failed to show raw notification: {e}");
        }
    }

    pub async fn channel(&self, channel_name: &str) -> Option<Arc<PushChannel>> {
        self.registry.get(channel_name).await
    }

    pub async fn channel_count(&self) -> usize {
        self.registry.len().await
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use super::*;
    use crate::api::types::RelayError;
    use crate::protocols::host::{ScriptError, ScriptHost};
    use crate::runtime::channels::ChannelLifecycle;
    use crate::runtime::loopback::LoopbackTransport;

    /// Script host forwarding each script to the test.
    pub(crate) struct ForwardingHost(pub mpsc::UnboundedSender<String>);

    impl ScriptHost for ForwardingHost {
        type View = ();

        fn resolve_view(&self) -> Option<()> {
            Some(())
        }

        fn invoke(&self, _view: &(), script: &str) -> Result<(), ScriptError> {
            self.0
                .send(script.to_string())
                .map_err(|e| ScriptError(e.to_string()))
        }
    }

    /// Surface recording what it was asked to show.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub toasts: Mutex<Vec<ToastRequest>>,
        pub alerts: Mutex<Vec<(String, String)>>,
        pub failing: bool,
    }

    impl NotificationSurface for RecordingSurface {
        fn show_toast(&self, toast: &ToastRequest) -> Result<(), RelayError> {
            if self.failing {
                return Err(RelayError::SurfaceError {
                    message: "no notification permission".to_string(),
                });
            }
            self.toasts.lock().unwrap().push(toast.clone());
            Ok(())
        }

        fn show_alert(&self, title: &str, message: &str) -> Result<(), RelayError> {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
            Ok(())
        }
    }

    pub(crate) struct Harness {
        pub relay: Arc<PushRelay>,
        pub transport: Arc<LoopbackTransport>,
        pub surface: Arc<RecordingSurface>,
        pub scripts: mpsc::UnboundedReceiver<String>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_config(PushConfig::default())
        }

        pub fn with_config(config: PushConfig) -> Self {
            let transport = Arc::new(LoopbackTransport::new("https://push.example"));
            let surface = Arc::new(RecordingSurface::default());
            let (tx, scripts) = mpsc::unbounded_channel();
            let (dispatcher, worker) = CallbackDispatcher::new(ForwardingHost(tx));
            tokio::spawn(worker.run());

            Self {
                relay: Arc::new(PushRelay::new(
                    transport.clone(),
                    surface.clone(),
                    dispatcher,
                    config,
                )),
                transport,
                surface,
                scripts,
            }
        }

        pub async fn next_script(&mut self) -> String {
            self.scripts.recv().await.expect("dispatch worker stopped")
        }
    }

    fn options(payload: &str) -> RegistrationOptions {
        RegistrationOptions::from_json(payload).unwrap()
    }

    #[tokio::test]
    async fn test_register_fresh_channel_reports_uri_to_callback() {
        let mut harness = Harness::new();

        let result = harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        assert!(result.is_none());

        let uri = harness.transport.uri("MyChannel").unwrap();
        assert_eq!(
            harness.next_script().await,
            format!(r#"myCb({{"uri":"{uri}","channel":"MyChannel"}})"#)
        );
        assert!(harness.transport.is_bound("MyChannel"));
        let channel = harness.relay.channel("MyChannel").await.unwrap();
        assert_eq!(channel.lifecycle(), ChannelLifecycle::Bound);
    }

    #[tokio::test]
    async fn test_register_existing_channel_returns_same_uri() {
        let mut harness = Harness::new();
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        harness.next_script().await;

        let result = harness
            .relay
            .register(options(r#"{"channelName":"MyChannel"}"#))
            .await
            .unwrap();

        assert_eq!(result.channel_name, "MyChannel");
        assert_eq!(Some(result.uri), harness.transport.uri("MyChannel"));
        assert_eq!(harness.transport.open_count(), 1);
        assert_eq!(harness.relay.channel_count().await, 1);
    }

    #[tokio::test]
    async fn test_reregistration_does_not_duplicate_deliveries() {
        let mut harness = Harness::new();
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        harness.next_script().await;
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;

        assert!(harness.transport.push_toast("MyChannel", [("wp:Text1", "Hi")]));
        assert!(harness.transport.push_raw("MyChannel", "marker"));

        assert_eq!(
            harness.next_script().await,
            r#"myCb({"type":"toast","jsonContent":{"wp:Text1":"Hi"}})"#
        );
        // A duplicate toast would arrive before the marker
        assert_eq!(
            harness.next_script().await,
            r#"myCb({"type":"raw","jsonContent":{"Body":"marker"}})"#
        );
    }

    #[tokio::test]
    async fn test_raw_body_round_trips() {
        let mut harness = Harness::new();
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        harness.next_script().await;
        let body = "{\"order\":42}\n\ttabs, \"quotes\", \\backslashes\\ and \u{00e9}";

        harness.transport.push_raw("MyChannel", body);

        let script = harness.next_script().await;
        let json = script
            .strip_prefix("myCb(")
            .and_then(|s| s.strip_suffix(')'))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["type"], "raw");
        assert_eq!(value["jsonContent"]["Body"], body);
    }

    #[tokio::test]
    async fn test_channel_error_reported_to_callback() {
        let mut harness = Harness::new();
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        harness.next_script().await;

        harness.transport.push_error(
            "MyChannel",
            ChannelErrorKind::PayloadFormatError,
            "bad payload",
        );

        assert_eq!(
            harness.next_script().await,
            r#"myCb({"code":"PayloadFormatError","message":"bad payload"})"#
        );
    }

    #[tokio::test]
    async fn test_open_failure_allows_fresh_open() {
        let mut harness = Harness::new();
        harness.transport.fail_next_open("service unavailable");

        let result = harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        assert!(result.is_none());
        assert_eq!(
            harness.next_script().await,
            r#"myCb({"code":"ChannelOpenFailed","message":"service unavailable"})"#
        );
        assert_eq!(harness.relay.channel_count().await, 0);

        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        let uri = harness.transport.uri("MyChannel").unwrap();
        assert_eq!(
            harness.next_script().await,
            format!(r#"myCb({{"uri":"{uri}","channel":"MyChannel"}})"#)
        );
    }

    #[tokio::test]
    async fn test_unbound_when_binding_disabled() {
        let mut harness = Harness::with_config(PushConfig {
            bind_shell_surfaces: false,
            ..PushConfig::default()
        });
        harness
            .relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        harness.next_script().await;

        assert!(!harness.transport.is_bound("MyChannel"));
        let channel = harness.relay.channel("MyChannel").await.unwrap();
        assert_eq!(channel.lifecycle(), ChannelLifecycle::Open);
    }

    #[tokio::test]
    async fn test_channels_deliver_to_their_own_callback() {
        let mut harness = Harness::new();
        harness
            .relay
            .register(options(r#"{"channelName":"A","ecb":"onA"}"#))
            .await;
        assert!(harness.next_script().await.starts_with("onA("));
        harness
            .relay
            .register(options(r#"{"channelName":"B","ecb":"onB"}"#))
            .await;
        assert!(harness.next_script().await.starts_with("onB("));

        harness.transport.push_raw("B", "to b");

        assert_eq!(
            harness.next_script().await,
            r#"onB({"type":"raw","jsonContent":{"Body":"to b"}})"#
        );
    }

    #[tokio::test]
    async fn test_show_notifications() {
        let harness = Harness::new();

        harness.relay.show_toast_notification(&ToastRequest {
            title: "Hi".to_string(),
            content: "There".to_string(),
            navigation_uri: None,
        });
        harness.relay.show_raw_notification("payload");

        assert_eq!(harness.surface.toasts.lock().unwrap().len(), 1);
        let (title, text) = harness.surface.alerts.lock().unwrap()[0].clone();
        assert_eq!(title, "Push Notification");
        assert!(text.starts_with("Received Notification "));
        assert!(text.ends_with(":\npayload"));
    }

    #[test]
    fn test_raw_alert_text_shows_time() {
        let time = NaiveTime::from_hms_opt(9, 5, 30).unwrap();

        assert_eq!(
            raw_alert_text("line 1\nline 2", time),
            "Received Notification 09:05:\nline 1\nline 2"
        );
    }

    #[tokio::test]
    async fn test_failed_open_releases_channel_resources() {
        let Harness {
            relay,
            transport,
            mut scripts,
            ..
        } = Harness::new();
        transport.fail_next_open("service unavailable");

        relay
            .register(options(r#"{"channelName":"MyChannel","ecb":"myCb"}"#))
            .await;
        assert!(scripts.recv().await.is_some());

        // The worker stops once the relay and every channel adapter are gone
        drop(relay);
        assert_eq!(scripts.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_opens_once() {
        let mut harness = Harness::new();
        let mut tasks = tokio::task::JoinSet::new();

        for i in 0..16 {
            let relay = harness.relay.clone();
            tasks.spawn(async move {
                let payload = format!(r#"{{"channelName":"Shared","ecb":"cb{i}"}}"#);
                relay.register(options(&payload)).await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(harness.transport.open_count(), 1);
        assert_eq!(harness.relay.channel_count().await, 1);
        let uri = harness.transport.uri("Shared").unwrap();
        assert!(harness
            .next_script()
            .await
            .ends_with(&format!(r#"({{"uri":"{uri}","channel":"Shared"}})"#)));

        // A second URI report would arrive before the marker
        harness.transport.push_raw("Shared", "marker");
        assert!(harness
            .next_script()
            .await
            .ends_with(r#"({"type":"raw","jsonContent":{"Body":"marker"}})"#));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_events_from_foreign_threads_keep_channel_order() {
        const PER_CHANNEL: usize = 50;
        let mut harness = Harness::new();
        for (name, callback) in [("A", "onA"), ("B", "onB")] {
            let payload = format!(r#"{{"channelName":"{name}","ecb":"{callback}"}}"#);
            harness.relay.register(options(&payload)).await;
            harness.next_script().await;
        }

        let producers: Vec<_> = ["A", "B"]
            .into_iter()
            .map(|name| {
                let transport = harness.transport.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_CHANNEL {
                        assert!(transport.push_raw(name, format!("{name}-{i}")));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut bodies = std::collections::HashMap::<&str, Vec<String>>::new();
        for _ in 0..2 * PER_CHANNEL {
            let script = harness.next_script().await;
            let (name, json) = if let Some(rest) = script.strip_prefix("onA(") {
                ("A", rest)
            } else if let Some(rest) = script.strip_prefix("onB(") {
                ("B", rest)
            } else {
                panic!("unexpected script: {script}");
            };
            let json = json.strip_suffix(')').unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["type"], "raw");
            bodies
                .entry(name)
                .or_default()
                .push(value["jsonContent"]["Body"].as_str().unwrap().to_string());
        }

        for name in ["A", "B"] {
            let expected: Vec<String> = (0..PER_CHANNEL).map(|i| format!("{name}-{i}")).collect();
            assert_eq!(bodies[name], expected);
        }
    }
}
