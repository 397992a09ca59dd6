//! Transport layer: WebSocket lane and REST surface over the store.

pub mod codec;
pub mod rest;
pub mod ws;
