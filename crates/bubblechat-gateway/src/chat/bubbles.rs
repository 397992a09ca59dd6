use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

use bubblechat_core::clock::now_millis;
use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::protocol::paths;
use bubblechat_core::protocol::records::{decode_bubbles, encode, BubbleRecord};
use bubblechat_core::{ColorIdentity, RoomCode};

use crate::store::{RealtimeStore, Subscription};

const DEFAULT_X_RANGE: Range<f64> = 10.0..90.0;

/// A bubble as seen by a client: store key, stored record, local popping flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub key: String,
    pub record: BubbleRecord,
    pub popping: bool,
}

pub struct BubbleSubscription {
    inner: Subscription,
}

impl BubbleSubscription {
    /// Full bubble list in creation order.
    pub async fn next(&mut self) -> Option<Vec<Bubble>> {
        let value = self.inner.next().await?;
        Some(
            decode_bubbles(value.as_ref())
                .into_iter()
                .map(|(key, record)| Bubble { key, record, popping: false })
                .collect(),
        )
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}

/// Posts, streams and pops `rooms/{code}/bubbles`.
pub struct BubbleFeed {
    store: Arc<dyn RealtimeStore>,
    pop_delay: Duration,
    x_range: Range<f64>,
}

impl BubbleFeed {
    pub fn new(store: Arc<dyn RealtimeStore>, pop_delay: Duration, x_min: f64, x_max: f64) -> Self {
        let x_range = if x_min < x_max {
            x_min..x_max
        } else {
            tracing::warn!(x_min, x_max, "empty bubble x range, using default");
            DEFAULT_X_RANGE
        };
        Self { store, pop_delay, x_range }
    }

    pub fn pop_delay(&self) -> Duration {
        self.pop_delay
    }

    /// Append a bubble under a store-assigned key. Only empty or
    /// whitespace-only text is rejected; the text is stored as typed.
    pub async fn post(
        &self,
        room: &RoomCode,
        author_tag: &str,
        color: ColorIdentity,
        text: &str,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ChatError::BadRequest("bubble text is empty".into()));
        }
        let now = now_millis();
        let record = BubbleRecord {
            id: now,
            text: text.to_string(),
            color,
            user: author_tag.to_string(),
            x: rand::thread_rng().gen_range(self.x_range.clone()),
            timestamp: now,
            is_popping: false,
        };
        let key = self.store.push(&paths::bubbles(room), encode(&record)?).await?;
        tracing::debug!(room = %room, key = %key, color = %color, "bubble posted");
        Ok(key)
    }

    pub async fn subscribe(&self, room: &RoomCode) -> Result<BubbleSubscription> {
        let inner = self.store.subscribe(&paths::bubbles(room)).await?;
        Ok(BubbleSubscription { inner })
    }

    /// Delete the bubble once the exit animation has had `pop_delay` to run.
    ///
    /// The returned task resolves to the delete result. A failed delete is
    /// logged and not retried; the bubble comes back on the next snapshot.
    pub fn request_pop(&self, room: &RoomCode, key: &str) -> JoinHandle<Result<()>> {
        let store = Arc::clone(&self.store);
        let path = paths::bubble(room, key);
        let delay = self.pop_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let res = store.delete(&path).await;
            if let Err(e) = &res {
                tracing::warn!(path = %path, error = %e, "bubble pop failed");
            }
            res
        })
    }
}
