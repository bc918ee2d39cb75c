use std::time::Duration;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{Credential, IncomingMessageEvent, RoomHandle};

/// One round of inbound events plus the position to resume from
#[derive(Debug, Clone, Default)]
pub struct SyncBatch {
    pub next_batch: String,
    pub events: Vec<IncomingMessageEvent>,
}

/// Transport trait - abstraction for the messaging network the bot lives on
#[async_trait]
pub trait Transport: Send + Sync {
    /// Join a room by name and return a handle for it
    async fn join_room(&self, name: &str) -> Result<RoomHandle, BotError>;

    /// Send a plain text message to a room, returning the event id
    async fn send_text(&self, room: &RoomHandle, text: &str) -> Result<String, BotError>;

    /// Resolve a user identifier to a human-readable display name
    async fn resolve_display_name(&self, user_id: &str) -> Result<String, BotError>;

    /// Wait for inbound events after `since`, up to `timeout`
    async fn sync(&self, since: Option<&str>, timeout: Duration) -> Result<SyncBatch, BotError>;
}

/// Authenticator trait - obtains credentials from the network
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in with a username and password
    async fn authenticate(&self, username: &str, password: &str) -> Result<Credential, BotError>;

    /// Create a new account and log in with it
    async fn register_account(&self, username: &str, password: &str) -> Result<Credential, BotError>;
}
