//! API types for the relay-web view bridge.
//!
//! This module defines stable types for commands and callback payloads,
//! isolating transport details from the script side.

pub mod types;
