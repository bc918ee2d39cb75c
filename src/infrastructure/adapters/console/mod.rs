//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::errors::BotError;
use crate::domain::entities::{IncomingMessageEvent, RoomHandle};
use crate::domain::traits::{SyncBatch, Transport};

/// Sender id attached to every line typed into the console
pub const CONSOLE_USER: &str = "@console:localhost";

/// Console bot adapter for local development
///
/// Each input line is a message from [`CONSOLE_USER`]. A line starting with
/// `#room ` goes to that room, anything else to the first joined room.
pub struct ConsoleAdapter<R = BufReader<Stdin>> {
    lines: tokio::sync::Mutex<Lines<R>>,
    rooms: Mutex<Vec<RoomHandle>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleAdapter<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(reader.lines()),
            rooms: Mutex::new(Vec::new()),
        }
    }

    fn route_line(&self, line: &str) -> Option<IncomingMessageEvent> {
        let rooms = self.rooms.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(rest) = line.strip_prefix('#') {
            if let Some((name, body)) = rest.split_once(' ') {
                if let Some(room) = rooms.iter().find(|r| r.name == name) {
                    return Some(IncomingMessageEvent::new(room.id.clone(), CONSOLE_USER, body));
                }
            }
        }
        let room = rooms.first()?;
        Some(IncomingMessageEvent::new(room.id.clone(), CONSOLE_USER, line))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Transport for ConsoleAdapter<R> {
    async fn join_room(&self, name: &str) -> Result<RoomHandle, BotError> {
        let handle = RoomHandle::new(format!("!{}:console", name), name);
        let mut rooms = self.rooms.lock().unwrap_or_else(|p| p.into_inner());
        if !rooms.contains(&handle) {
            rooms.push(handle.clone());
        }
        Ok(handle)
    }

    async fn send_text(&self, room: &RoomHandle, text: &str) -> Result<String, BotError> {
        println!("[BOT #{}] {}", room.name, text);
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn resolve_display_name(&self, user_id: &str) -> Result<String, BotError> {
        Ok(user_id
            .strip_prefix('@')
            .and_then(|id| id.split(':').next())
            .unwrap_or(user_id)
            .to_string())
    }

    async fn sync(&self, since: Option<&str>, _timeout: Duration) -> Result<SyncBatch, BotError> {
        let position = since.and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
        // The positioning sync has nothing queued yet.
        if since.is_none() {
            return Ok(SyncBatch {
                next_batch: position.to_string(),
                events: Vec::new(),
            });
        }

        let mut lines = self.lines.lock().await;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|e| BotError::Network(e.to_string()))?
                .ok_or(BotError::Closed)?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let events = self.route_line(line).into_iter().collect();
            return Ok(SyncBatch {
                next_batch: (position + 1).to_string(),
                events,
            });
        }
    }
}
