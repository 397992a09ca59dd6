//! Store boundary: the primitives the chat core needs from a real-time
//! key-tree store.
//!
//! - `subscribe(path)`: full snapshot at `path` now and after every change at
//!   or below it (coalesced; each delivery is the latest value).
//! - `write(path, value)`: upsert at an exact path; writing `null` deletes.
//! - `delete(path)`: remove the node and everything beneath it.
//! - `read_once(path)`: single snapshot.
//! - `beacon_delete(path)`: best-effort fire-and-forget delete issued when a
//!   client goes away. Never awaited, never retried, never relied upon.

mod memory;
mod subscription;

use async_trait::async_trait;
use serde_json::Value;

use bubblechat_core::error::Result;
use bubblechat_core::protocol::paths::StorePath;
use bubblechat_core::protocol::push_id::next_push_key;

pub use memory::MemoryStore;
pub use subscription::Subscription;

#[async_trait]
pub trait RealtimeStore: Send + Sync {
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription>;
    async fn write(&self, path: &StorePath, value: Value) -> Result<()>;
    async fn delete(&self, path: &StorePath) -> Result<()>;
    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>>;
    fn beacon_delete(&self, path: &StorePath);

    /// Write `value` under a fresh store-assigned child key of `parent`.
    async fn push(&self, parent: &StorePath, value: Value) -> Result<String> {
        let key = next_push_key();
        self.write(&parent.child(&key), value).await?;
        Ok(key)
    }
}
