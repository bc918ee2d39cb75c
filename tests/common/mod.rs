//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, Once};
use std::time::Duration;

use dice_bot::application::errors::BotError;
use dice_bot::domain::entities::{Credential, IncomingMessageEvent, RoomHandle};
use dice_bot::domain::traits::{Authenticator, SyncBatch, Transport};

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn room_id(name: &str) -> String {
    format!("!{}:test", name)
}

/// In-process transport with scripted sync rounds and recorded sends
#[derive(Default)]
pub struct FakeTransport {
    backlog: Vec<IncomingMessageEvent>,
    rounds: Mutex<VecDeque<Result<Vec<IncomingMessageEvent>, BotError>>>,
    unjoinable: HashSet<String>,
    failing_sends: Mutex<usize>,
    display_names: HashMap<String, String>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub lookups: Mutex<Vec<String>>,
    pub joined: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events already waiting when the bot starts listening
    pub fn with_backlog(mut self, events: Vec<IncomingMessageEvent>) -> Self {
        self.backlog = events;
        self
    }

    /// Queue one sync round
    pub fn with_round(self, events: Vec<IncomingMessageEvent>) -> Self {
        self.rounds.lock().unwrap().push_back(Ok(events));
        self
    }

    pub fn with_sync_error(self, error: BotError) -> Self {
        self.rounds.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_unjoinable(mut self, name: &str) -> Self {
        self.unjoinable.insert(name.to_string());
        self
    }

    /// Fail the next `count` sends
    pub fn with_failing_sends(self, count: usize) -> Self {
        *self.failing_sends.lock().unwrap() = count;
        self
    }

    pub fn with_display_name(mut self, user_id: &str, name: &str) -> Self {
        self.display_names.insert(user_id.to_string(), name.to_string());
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, room: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r == room)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn join_room(&self, name: &str) -> Result<RoomHandle, BotError> {
        if self.unjoinable.contains(name) {
            return Err(BotError::Network(format!("M_NOT_FOUND: no room {}", name)));
        }
        self.joined.lock().unwrap().push(name.to_string());
        Ok(RoomHandle::new(room_id(name), name))
    }

    async fn send_text(&self, room: &RoomHandle, text: &str) -> Result<String, BotError> {
        {
            let mut failing = self.failing_sends.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(BotError::Network("send failed".to_string()));
            }
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((room.name.clone(), text.to_string()));
        Ok(format!("$event{}", sent.len()))
    }

    async fn resolve_display_name(&self, user_id: &str) -> Result<String, BotError> {
        self.lookups.lock().unwrap().push(user_id.to_string());
        self.display_names
            .get(user_id)
            .cloned()
            .ok_or_else(|| BotError::Network("profile lookup failed".to_string()))
    }

    async fn sync(&self, since: Option<&str>, _timeout: Duration) -> Result<SyncBatch, BotError> {
        let Some(since) = since else {
            return Ok(SyncBatch {
                next_batch: "0".to_string(),
                events: self.backlog.clone(),
            });
        };
        let next: u64 = since.parse().unwrap_or(0) + 1;
        let round = self.rounds.lock().unwrap().pop_front();
        match round {
            Some(Ok(events)) => Ok(SyncBatch {
                next_batch: next.to_string(),
                events,
            }),
            Some(Err(e)) => Err(e),
            None => Err(BotError::Closed),
        }
    }
}

/// Authenticator that counts calls and can refuse unknown accounts
#[derive(Default)]
pub struct FakeAuthenticator {
    pub account_exists: bool,
    pub logins: Mutex<usize>,
    pub registrations: Mutex<usize>,
}

impl FakeAuthenticator {
    pub fn existing() -> Self {
        Self {
            account_exists: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> (usize, usize) {
        (*self.logins.lock().unwrap(), *self.registrations.lock().unwrap())
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self, username: &str, _password: &str) -> Result<Credential, BotError> {
        *self.logins.lock().unwrap() += 1;
        if self.account_exists {
            Ok(Credential::new(format!("token-{}", username)))
        } else {
            Err(BotError::AccountNotFound("M_FORBIDDEN".to_string()))
        }
    }

    async fn register_account(&self, username: &str, _password: &str) -> Result<Credential, BotError> {
        *self.registrations.lock().unwrap() += 1;
        Ok(Credential::new(format!("new-token-{}", username)))
    }
}
