//! Taskboard sync server library.
//!
//! Exposes the board server for use in tests and embedding: the
//! authoritative task store, the WebSocket sync engine, the attachment
//! intake, and the configuration layer.

pub mod board;
pub mod config;
pub mod store;
pub mod uploads;
