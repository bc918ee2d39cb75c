use chrono::{DateTime, Utc};

/// Kind of message content, as declared by the sender's client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Notice,
    Emote,
    Image,
    File,
    Audio,
    Video,
    Location,
    Other(String),
}

impl MessageKind {
    /// Map a Matrix `msgtype` onto a kind
    pub fn from_msgtype(msgtype: &str) -> Self {
        match msgtype {
            "m.text" => MessageKind::Text,
            "m.notice" => MessageKind::Notice,
            "m.emote" => MessageKind::Emote,
            "m.image" => MessageKind::Image,
            "m.file" => MessageKind::File,
            "m.audio" => MessageKind::Audio,
            "m.video" => MessageKind::Video,
            "m.location" => MessageKind::Location,
            other => MessageKind::Other(other.to_string()),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MessageKind::Text)
    }
}

/// A message event received in a joined room
#[derive(Debug, Clone)]
pub struct IncomingMessageEvent {
    pub event_id: String,
    pub room_id: String,
    pub sender: String,
    pub body: String,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessageEvent {
    pub fn new(room_id: impl Into<String>, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.into(),
            sender: sender.into(),
            body: body.into(),
            kind: MessageKind::Text,
            timestamp: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
