//! Command handlers exposed to the web view.
//!
//! With the `tauri` feature each command is a Tauri command; the parsing and
//! relay calls behind them are available without it.

pub mod push;
