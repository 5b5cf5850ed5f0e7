//! Protocol layer - abstractions over the relay's external collaborators.
//!
//! This module provides:
//! - `PushTransport` trait: relay → push service boundary, with `EventSink`
//!   carrying channel events back
//! - `ScriptHost` trait: relay → script engine boundary
//! - `NotificationSurface` trait: relay → native toast/alert boundary
//!
//! The protocol layer does NOT hold channel state. The registry and
//! callback names live in the runtime layer.

pub mod host;
pub mod transport;

pub use host::{NotificationSurface, ScriptError, ScriptHost};
pub use transport::{ChannelEvent, EventSink, PushTransport, RawBody};
