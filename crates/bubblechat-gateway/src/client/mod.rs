//! Client-side application state and update loop.
//!
//! `ChatState` is the single source of truth a view renders. `ChatClient`
//! turns user intents into directory/presence/feed calls and feeds store
//! snapshots back into the state as `ChatEvent`s.

mod chat_client;
mod state;

pub use chat_client::ChatClient;
pub use state::{ChatEvent, ChatState, ColorSelection};
