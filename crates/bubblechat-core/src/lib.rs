//! bubblechat core: domain primitives, store wire formats and error types.
//!
//! This crate defines the vocabulary shared by the store, the chat
//! coordination layer and the gateway: room codes, color identities, session
//! ids, store paths, push keys, record shapes, and the error surface. It
//! carries no transport or runtime dependencies so it can be reused by any
//! client of the store.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ChatError`/`Result` so a malformed
//! snapshot or a hostile room code never takes a client down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod color;
pub mod error;
pub mod protocol;
pub mod room;
pub mod session;

pub use color::ColorIdentity;
/// Shared result type.
pub use error::{ChatError, ClientCode, Result};
pub use room::RoomCode;
pub use session::SessionId;
