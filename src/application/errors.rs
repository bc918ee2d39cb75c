//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Credential rejected: {0}")]
    Unauthorized(String),

    #[error("Failed to join room {room}: {source}")]
    Join {
        room: String,
        #[source]
        source: Box<BotError>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport closed")]
    Closed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the network refused the session credential itself
    pub fn is_credential_rejected(&self) -> bool {
        match self {
            BotError::Unauthorized(_) => true,
            BotError::Join { source, .. } => source.is_credential_rejected(),
            _ => false,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BotError::Network(_))
    }

    /// Wrap an error raised while joining `room`
    pub fn join(room: impl Into<String>, err: BotError) -> Self {
        BotError::Join {
            room: room.into(),
            source: Box::new(err),
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
