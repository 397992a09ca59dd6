//! bubblechat gateway library entry.
//!
//! This crate layers room, presence and bubble coordination over a
//! real-time key-tree store, provides the client-side state loop that a view
//! drives, and serves the store over WebSocket and REST. It is consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod chat;
pub mod client;
pub mod config;
pub mod obs;
pub mod router;
pub mod store;
pub mod transport;
