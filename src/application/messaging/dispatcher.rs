//! Room dispatcher - Joins rooms and routes their events to roll handling

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::application::services::RollService;
use crate::domain::entities::{IncomingMessageEvent, RoomHandle};
use crate::domain::traits::{SyncBatch, Transport};

/// Default long-poll timeout for one sync round
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// First wait after a transient sync failure; doubled per failure
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Longest wait between sync retries
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Per-room listener: a queue feeding a task that owns the room's replies
struct RoomListener {
    handle: RoomHandle,
    queue: mpsc::UnboundedSender<IncomingMessageEvent>,
    task: JoinHandle<()>,
}

/// Message dispatcher - owns the listen loop and one handler task per room
///
/// Events of one room are answered in arrival order; different rooms are
/// handled concurrently.
pub struct RoomDispatcher {
    transport: Arc<dyn Transport>,
    service: Arc<RollService>,
    rooms: HashMap<String, RoomListener>,
    sync_timeout: Duration,
    retry_delay: Duration,
}

impl RoomDispatcher {
    pub fn new(transport: Arc<dyn Transport>, service: Arc<RollService>) -> Self {
        Self {
            transport,
            service,
            rooms: HashMap::new(),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Join every named room in order and start its listener.
    ///
    /// The first failure aborts; rooms joined before it stay joined.
    pub async fn join_rooms<I, S>(&mut self, names: I) -> Result<(), BotError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            let handle = self
                .transport
                .join_room(name)
                .await
                .map_err(|e| BotError::join(name, e))?;
            tracing::info!("Joined room {}", handle);
            self.on_message(handle);
        }
        Ok(())
    }

    /// Register the listener for a joined room
    pub fn on_message(&mut self, handle: RoomHandle) {
        if self.rooms.contains_key(&handle.id) {
            return;
        }
        let (queue, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(room_task(
            handle.clone(),
            events,
            self.transport.clone(),
            self.service.clone(),
        ));
        self.rooms.insert(handle.id.clone(), RoomListener { handle, queue, task });
    }

    /// Hand an event to the listener of its room; events for other rooms are dropped
    pub fn route(&self, event: IncomingMessageEvent) {
        if let Some(listener) = self.rooms.get(&event.room_id) {
            // Only fails once the room task is gone, and then nobody is listening.
            let _ = listener.queue.send(event);
        }
    }

    /// Listen until the transport closes or fails for good.
    ///
    /// The first sync only positions the stream, so messages sent while the
    /// bot was offline are not answered. Network failures are retried with
    /// a capped backoff from the same position. On exit every room task is allowed to
    /// finish the events already queued for it.
    pub async fn run(self) -> Result<(), BotError> {
        tracing::info!("Listening in {} room(s)", self.rooms.len());

        let result = self.listen().await;

        let RoomDispatcher { rooms, .. } = self;
        for (_, listener) in rooms {
            drop(listener.queue);
            if let Err(e) = listener.task.await {
                tracing::error!("Handler for {} crashed: {}", listener.handle, e);
            }
        }

        match result {
            Err(BotError::Closed) => {
                tracing::info!("Transport closed, stopping");
                Ok(())
            }
            other => other,
        }
    }

    async fn listen(&self) -> Result<(), BotError> {
        let mut since = self.sync(None, Duration::ZERO).await?.next_batch;

        loop {
            let batch = self.sync(Some(&since), self.sync_timeout).await?;
            for event in batch.events {
                self.route(event);
            }
            since = batch.next_batch;
        }
    }

    async fn sync(&self, since: Option<&str>, timeout: Duration) -> Result<SyncBatch, BotError> {
        let mut delay = self.retry_delay;
        loop {
            match self.transport.sync(since, timeout).await {
                Err(e) if e.is_transient() => {
                    tracing::warn!("Sync failed, retrying in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
                other => return other,
            }
        }
    }
}

async fn room_task(
    room: RoomHandle,
    mut events: mpsc::UnboundedReceiver<IncomingMessageEvent>,
    transport: Arc<dyn Transport>,
    service: Arc<RollService>,
) {
    while let Some(event) = events.recv().await {
        let Some(reply) = service.reply_for(&event).await else {
            continue;
        };
        if let Err(e) = transport.send_text(&room, &reply).await {
            tracing::warn!("[{}] Dropping reply to {}: {}", room.name, event.event_id, e);
        }
    }
}
