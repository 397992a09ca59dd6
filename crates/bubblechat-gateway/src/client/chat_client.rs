use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::{ColorIdentity, RoomCode, SessionId};

use super::state::{ChatEvent, ChatState, ColorSelection};
use crate::chat::{
    BubbleFeed, BubbleSubscription, PresenceRegistry, PresenceSubscription, RoomDirectory, RoomWatch,
};
use crate::config::ChatSection;
use crate::store::RealtimeStore;

/// Subscriptions of the room the client is in. Dropping them detaches them.
struct RoomSubscriptions {
    code: RoomCode,
    info: RoomWatch,
    presence: PresenceSubscription,
    bubbles: BubbleSubscription,
}

/// One connected client: a session, at most one room, and the state a view
/// renders.
///
/// Single owner, `&mut self` everywhere: intents and inbound events are
/// applied in the order the owner drives them, so `ChatState` needs no
/// locking.
pub struct ChatClient {
    rooms: RoomDirectory,
    presence: PresenceRegistry,
    feed: BubbleFeed,
    state: ChatState,
    subs: Option<RoomSubscriptions>,
    events_tx: mpsc::UnboundedSender<ChatEvent>,
    events_rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl ChatClient {
    /// New client with a freshly generated session.
    pub fn new(store: Arc<dyn RealtimeStore>, settings: &ChatSection) -> Self {
        Self::with_session(store, settings, SessionId::generate())
    }

    pub fn with_session(store: Arc<dyn RealtimeStore>, settings: &ChatSection, session: SessionId) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            rooms: RoomDirectory::new(Arc::clone(&store), settings.min_room_code_len),
            presence: PresenceRegistry::new(Arc::clone(&store)),
            feed: BubbleFeed::new(
                store,
                Duration::from_millis(settings.pop_delay_ms),
                settings.bubble_x_min,
                settings.bubble_x_max,
            ),
            state: ChatState::new(session),
            subs: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn session(&self) -> &SessionId {
        &self.state.session
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.state.room.as_ref()
    }

    pub async fn create_room(&mut self, raw: &str) -> Result<RoomCode> {
        let res = self.rooms.create_room(raw, &self.state.session).await;
        let code = self.surface(res)?;
        self.enter(code).await
    }

    pub async fn join_room(&mut self, raw: &str) -> Result<RoomCode> {
        let res = self.rooms.join_room(raw).await;
        let code = self.surface(res)?;
        self.enter(code).await
    }

    /// Delete a room (the caller has already confirmed). If it is the current
    /// room the client drops out of it.
    pub async fn delete_room(&mut self, raw: &str) -> Result<()> {
        let code = self.surface(self.rooms.normalize(raw))?;
        let res = self.rooms.delete_room(code.as_str()).await;
        self.surface(res)?;
        if self.state.room.as_ref() == Some(&code) {
            self.exit_room();
        }
        Ok(())
    }

    /// Claim a color, or change to it when one is already held.
    ///
    /// The selection goes `Pending` before the write and `Confirmed` after it;
    /// on failure it reverts to what it was.
    pub async fn pick_color(&mut self, color: ColorIdentity) -> Result<()> {
        let room = self.current_room()?;
        let current = self.state.selection.color();
        if current == Some(color) {
            tracing::debug!(color = %color, "color unchanged");
            return Err(ChatError::NoOp);
        }
        if let Err(e) = PresenceRegistry::ensure_free(&self.state.presence, &self.state.session, color) {
            self.state.notice = Some(e.to_string());
            return Err(e);
        }

        let previous = self.state.selection;
        self.state.selection = ColorSelection::Pending(color);

        let res = match current {
            None => {
                self.presence
                    .claim_color(&room, &self.state.session, color, &self.state.presence)
                    .await
            }
            Some(cur) => {
                self.presence
                    .change_color(&room, &self.state.session, Some(cur), color, &self.state.presence)
                    .await
            }
        };

        match res {
            Ok(()) => {
                self.state.selection = ColorSelection::Confirmed(color);
                self.state.notice = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(room = %room, color = %color, error = %e, "color selection failed");
                self.state.selection = previous;
                Err(e)
            }
        }
    }

    /// Post a bubble in the current color. Failures are logged and leave the
    /// state untouched.
    pub async fn send(&mut self, text: &str) -> Result<String> {
        let room = self.current_room()?;
        let color = self
            .state
            .selection
            .color()
            .ok_or_else(|| ChatError::BadRequest("pick a color first".into()))?;
        let res = self.feed.post(&room, color.user_tag(), color, text).await;
        if let Err(e) = &res {
            tracing::warn!(room = %room, error = %e, "bubble post failed");
        }
        res
    }

    /// Mark a bubble popping now and delete it after the pop delay.
    /// Returns false if the bubble is unknown or already popping.
    pub fn pop(&mut self, key: &str) -> bool {
        let Some(room) = self.state.room.clone() else {
            return false;
        };
        if !self.state.mark_popping(key) {
            return false;
        }
        let task = self.feed.request_pop(&room, key);
        let tx = self.events_tx.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            if !matches!(task.await, Ok(Ok(()))) {
                let _ = tx.send(ChatEvent::PopFailed(key));
            }
        });
        true
    }

    /// Explicit logout: remove presence, leave the room.
    pub async fn logout(&mut self) {
        let Some(room) = self.state.room.clone() else {
            return;
        };
        if let Err(e) = self.presence.leave(&room, &self.state.session).await {
            tracing::warn!(room = %room, error = %e, "presence removal on logout failed");
        }
        self.exit_room();
        tracing::info!(room = %room, session = %self.state.session, "logged out");
    }

    /// Page-unload hook: best-effort presence removal, then drop everything.
    pub fn unload(mut self) {
        if let Some(room) = self.state.room.clone() {
            self.presence.leave_on_unload(&room, &self.state.session);
        }
        self.exit_room();
    }

    /// Wait for the next inbound event and apply it.
    ///
    /// Outside a room only already-queued events are returned, so this never
    /// waits forever on an idle client.
    pub async fn next_event(&mut self) -> Option<ChatEvent> {
        let event = match self.subs.as_mut() {
            Some(subs) => tokio::select! {
                snap = subs.presence.next() => snap.map(ChatEvent::Presence),
                list = subs.bubbles.next() => list.map(ChatEvent::Bubbles),
                gone = subs.info.deleted() => gone.map(|()| ChatEvent::RoomDeleted(subs.code.clone())),
                Some(ev) = self.events_rx.recv() => Some(ev),
            },
            None => self.events_rx.try_recv().ok(),
        }?;
        self.dispatch(event.clone());
        Some(event)
    }

    /// Apply every event that is ready without waiting. Returns the number
    /// of events applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let mut ready = Vec::new();
            if let Some(subs) = self.subs.as_mut() {
                if let Some(Some(snap)) = subs.presence.next().now_or_never() {
                    ready.push(ChatEvent::Presence(snap));
                }
                if let Some(Some(list)) = subs.bubbles.next().now_or_never() {
                    ready.push(ChatEvent::Bubbles(list));
                }
                if let Some(Some(())) = subs.info.deleted().now_or_never() {
                    ready.push(ChatEvent::RoomDeleted(subs.code.clone()));
                }
            }
            while let Ok(ev) = self.events_rx.try_recv() {
                ready.push(ev);
            }
            if ready.is_empty() {
                return applied;
            }
            applied += ready.len();
            for ev in ready {
                self.dispatch(ev);
            }
        }
    }

    fn dispatch(&mut self, event: ChatEvent) {
        if let ChatEvent::RoomDeleted(code) = &event {
            if self.state.room.as_ref() == Some(code) {
                tracing::info!(room = %code, session = %self.state.session, "room deleted while inside");
                self.drop_subscriptions();
            }
        }
        self.state.apply(event);
    }

    async fn enter(&mut self, code: RoomCode) -> Result<RoomCode> {
        if self.state.room.is_some() {
            self.logout().await;
        }
        let info = self.rooms.watch(&code).await;
        let info = self.surface(info)?;
        let presence = self.presence.subscribe(&code).await;
        let presence = self.surface(presence)?;
        let bubbles = self.feed.subscribe(&code).await;
        let bubbles = self.surface(bubbles)?;

        self.subs = Some(RoomSubscriptions {
            code: code.clone(),
            info,
            presence,
            bubbles,
        });
        self.state.room = Some(code.clone());
        self.state.notice = None;
        tracing::info!(room = %code, session = %self.state.session, "entered room");
        Ok(code)
    }

    fn exit_room(&mut self) {
        self.drop_subscriptions();
        self.state.clear_room();
    }

    fn drop_subscriptions(&mut self) {
        if let Some(subs) = self.subs.take() {
            subs.info.unsubscribe();
            subs.presence.unsubscribe();
            subs.bubbles.unsubscribe();
        }
    }

    fn current_room(&self) -> Result<RoomCode> {
        self.state
            .room
            .clone()
            .ok_or_else(|| ChatError::BadRequest("not in a room".into()))
    }

    /// Record room-level failures as the inline notice.
    fn surface<T>(&mut self, res: Result<T>) -> Result<T> {
        if let Err(e) = &res {
            tracing::warn!(error = %e, "room request failed");
            self.state.notice = Some(e.to_string());
        }
        res
    }
}
