//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Homeserver name, also the server part of room aliases
    pub server: String,
    pub username: String,
    pub password: String,
    #[serde(alias = "groups")]
    pub rooms: Vec<String>,
    /// Base URL of the homeserver API, `https://{server}` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeserver_url: Option<String>,
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
}

fn default_sync_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config {}: {}", path.display(), e)))?;

        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("server", &self.server),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field.to_string()));
            }
        }

        let mut rooms: Vec<String> = Vec::with_capacity(self.rooms.len());
        for room in self.rooms.drain(..) {
            let room = room.trim().to_string();
            if room.is_empty() {
                return Err(ConfigError::InvalidValue("empty room name".to_string()));
            }
            if !rooms.contains(&room) {
                rooms.push(room);
            }
        }
        if rooms.is_empty() {
            return Err(ConfigError::MissingField("rooms".to_string()));
        }
        self.rooms = rooms;

        if let Some(url) = &self.homeserver_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!("homeserver-url must be http(s): {}", url)));
            }
        }

        Ok(self)
    }

    pub fn homeserver_url(&self) -> String {
        match &self.homeserver_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.server),
        }
    }

    /// Fully qualified user id of the bot account
    pub fn user_id(&self) -> String {
        format!("@{}:{}", self.username, self.server)
    }

    /// Alias used to join a configured room
    ///
    /// Names that are already aliases or room ids are used as-is.
    pub fn room_alias(&self, name: &str) -> String {
        if name.starts_with('#') || name.starts_with('!') {
            name.to_string()
        } else {
            format!("#{}:{}", name, self.server)
        }
    }

    pub fn room_aliases(&self) -> Vec<String> {
        self.rooms.iter().map(|r| self.room_alias(r)).collect()
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Sample configuration written by `init-config`
    pub fn example() -> Self {
        Self {
            server: "matrix.example.org".to_string(),
            username: "dice-bot".to_string(),
            password: "change-me".to_string(),
            rooms: vec!["tabletop".to_string()],
            homeserver_url: None,
            sync_timeout_secs: default_sync_timeout_secs(),
        }
    }
}
