//! Chat coordination layered on the store.
//!
//! - `RoomDirectory`: create / join / delete rooms.
//! - `PresenceRegistry`: who holds which color, with best-effort exclusivity.
//! - `BubbleFeed`: post, stream and pop bubbles.
//!
//! None of these hold locks or local caches of their own; every guarantee is
//! whatever the store's per-path ordering gives, checked optimistically.

mod bubbles;
mod presence;
mod rooms;

pub use bubbles::{Bubble, BubbleFeed, BubbleSubscription};
pub use presence::{PresenceRegistry, PresenceSnapshot, PresenceSubscription};
pub use rooms::{RoomDirectory, RoomWatch};
