use futures_util::Stream;
use serde_json::Value;
use tokio::sync::watch;

use bubblechat_core::protocol::paths::StorePath;

type Disposer = Box<dyn FnOnce() + Send + Sync>;

/// A live snapshot stream for one path.
///
/// The first `next()` yields the value current at subscription time; later
/// calls wait for a change. Intermediate values may be skipped. Dropping the
/// subscription (or calling [`Subscription::unsubscribe`]) runs the disposer
/// that detaches it from the store.
pub struct Subscription {
    path: StorePath,
    rx: watch::Receiver<Option<Value>>,
    primed: bool,
    disposer: Option<Disposer>,
}

impl Subscription {
    pub fn new(
        path: StorePath,
        rx: watch::Receiver<Option<Value>>,
        disposer: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            path,
            rx,
            primed: false,
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Next snapshot (`None` inside means "no value at path").
    /// Returns `None` once the store side has gone away.
    ///
    /// Cancel-safe: dropping the future before it resolves loses nothing.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Latest value without waiting.
    pub fn current(&self) -> Option<Value> {
        self.rx.borrow().clone()
    }

    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    pub fn into_stream(self) -> impl Stream<Item = Option<Value>> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|v| (v, sub))
        })
    }

    fn dispose(&mut self) {
        if let Some(d) = self.disposer.take() {
            d();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path.to_string())
            .field("active", &self.disposer.is_some())
            .finish()
    }
}
