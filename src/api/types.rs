//! Bridge types for commands and callback payloads.
//!
//! These types provide a stable API surface for the web view,
//! hiding transport details.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use specta::Type;

/// Name of a push channel, unique within a relay
pub type ChannelName = String;

/// Options for a `register` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct RegistrationOptions {
    /// Channel to open or reuse
    #[serde(rename = "channelName")]
    pub channel_name: ChannelName,
    /// Script function that receives channel results and notifications
    #[serde(rename = "ecb", default)]
    pub callback_name: Option<String>,
}

impl RegistrationOptions {
    /// Parse and validate options from their JSON text form.
    ///
    /// # Errors
    /// * `RelayError::ParseError` - Malformed JSON, missing or empty channel name,
    ///   or a callback name that is not a script identifier path
    pub fn from_json(payload: &str) -> Result<Self, RelayError> {
        let options: RegistrationOptions =
            serde_json::from_str(payload).map_err(|e| RelayError::ParseError {
                message: format!("Invalid registration options: {e}"),
            })?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), RelayError> {
        if self.channel_name.trim().is_empty() {
            return Err(RelayError::ParseError {
                message: "Channel name cannot be empty".to_string(),
            });
        }
        if let Some(callback) = &self.callback_name {
            if !is_script_identifier(callback) {
                return Err(RelayError::ParseError {
                    message: format!("Invalid callback name: {callback}"),
                });
            }
        }
        Ok(())
    }
}

/// Whether `name` is a dotted script identifier path such as `app.push.onEvent`.
///
/// The callback name is spliced into script text, so anything else is rejected.
pub fn is_script_identifier(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
                .expect("identifier pattern is valid")
        })
        .is_match(name)
}

/// Successful channel registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct RegisterResult {
    /// URI the remote sender pushes to
    pub uri: String,
    /// Channel name
    #[serde(rename = "channel")]
    pub channel_name: ChannelName,
}

/// Channel fault reported to the callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct RegisterError {
    /// Stringified channel error kind (e.g., "ChannelOpenFailed")
    pub code: String,
    /// Human-readable description from the transport
    pub message: String,
}

/// Kind of fault raised by a push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelErrorKind {
    ChannelOpenFailed,
    PayloadFormatError,
    MessageBadContent,
    NotificationRateTooHigh,
    PowerLevelChanged,
    Unknown,
}

impl std::fmt::Display for ChannelErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ChannelErrorKind::ChannelOpenFailed => "ChannelOpenFailed",
            ChannelErrorKind::PayloadFormatError => "PayloadFormatError",
            ChannelErrorKind::MessageBadContent => "MessageBadContent",
            ChannelErrorKind::NotificationRateTooHigh => "NotificationRateTooHigh",
            ChannelErrorKind::PowerLevelChanged => "PowerLevelChanged",
            ChannelErrorKind::Unknown => "Unknown",
        };
        f.write_str(code)
    }
}

/// Scalar value carried in a notification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

/// Key/value content of a notification
pub type Payload = BTreeMap<String, Value>;

/// Key under which a raw notification carries its body text
pub const RAW_BODY_KEY: &str = "Body";

/// Inbound notification normalized for the script callback.
///
/// Serialized as `{"type": "toast" | "raw", "jsonContent": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "jsonContent", rename_all = "lowercase")]
pub enum NotificationRecord {
    /// Structured system-level notification
    Toast(Payload),
    /// Unstructured payload delivered straight to the app
    Raw(Payload),
}

impl NotificationRecord {
    /// Build a toast record from an event collection; later duplicate keys win.
    pub fn toast<I, K, V>(collection: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        NotificationRecord::Toast(
            collection
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Build a raw record carrying the full body text.
    pub fn raw(body: String) -> Self {
        let mut payload = Payload::new();
        payload.insert(RAW_BODY_KEY.to_string(), Value::String(body));
        NotificationRecord::Raw(payload)
    }

    /// The `type` tag this record serializes with
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationRecord::Toast(_) => "toast",
            NotificationRecord::Raw(_) => "raw",
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            NotificationRecord::Toast(payload) | NotificationRecord::Raw(payload) => payload,
        }
    }
}

/// Argument handed to the script callback.
///
/// Untagged: the script sees `{uri, channel}`, `{code, message}` or `{type, jsonContent}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallbackPayload {
    Registered(RegisterResult),
    Failed(RegisterError),
    Notification(NotificationRecord),
}

impl From<RegisterResult> for CallbackPayload {
    fn from(result: RegisterResult) -> Self {
        CallbackPayload::Registered(result)
    }
}

impl From<RegisterError> for CallbackPayload {
    fn from(error: RegisterError) -> Self {
        CallbackPayload::Failed(error)
    }
}

impl From<NotificationRecord> for CallbackPayload {
    fn from(record: NotificationRecord) -> Self {
        CallbackPayload::Notification(record)
    }
}

/// Native toast to show via `showToastNotification`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ToastRequest {
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Content", default)]
    pub content: String,
    /// App location to open when the toast is activated
    #[serde(alias = "NavigationUri", default)]
    pub navigation_uri: Option<String>,
}

/// Relay errors for web view consumption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(tag = "type")]
pub enum RelayError {
    /// Malformed command arguments; the operation was aborted before side effects
    ParseError { message: String },
    /// Native channel fault
    ChannelError { code: String, message: String },
    /// Native toast or alert surface failed
    SurfaceError { message: String },
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::ParseError { message } => write!(f, "Parse error: {message}"),
            RelayError::ChannelError { code, message } => {
                write!(f, "Channel error ({code}): {message}")
            }
            RelayError::SurfaceError { message } => write!(f, "Surface error: {message}"),
        }
    }
}

impl RelayError {
    /// The error's own message, without the kind prefix `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            RelayError::ParseError { message }
            | RelayError::ChannelError { message, .. }
            | RelayError::SurfaceError { message } => message,
        }
    }
}

impl std::error::Error for RelayError {}
