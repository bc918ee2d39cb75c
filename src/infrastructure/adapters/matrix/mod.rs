//! Matrix adapter - client-server API over HTTPS

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{Credential, IncomingMessageEvent, MessageKind, RoomHandle};
use crate::domain::traits::{Authenticator, SyncBatch, Transport};

/// Client-server API version prefix
const API_PREFIX: [&str; 3] = ["_matrix", "client", "v3"];

/// Timeout for every request except the sync long-poll
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack on top of the server-side sync timeout
const SYNC_GRACE: Duration = Duration::from_secs(30);

const DEVICE_NAME: &str = "dice-bot";

/// Only room messages matter; everything else is filtered server-side.
const SYNC_FILTER: &str = r#"{"presence":{"types":[]},"account_data":{"types":[]},"room":{"state":{"types":[]},"ephemeral":{"types":[]},"account_data":{"types":[]},"timeline":{"types":["m.room.message"]}}}"#;

/// Matrix error body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub errcode: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: SyncRooms,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncRooms {
    #[serde(default)]
    pub join: HashMap<String, JoinedRoom>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub events: Vec<RoomEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub sender: String,
    pub event_id: String,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Matrix bot adapter
pub struct MatrixAdapter {
    base_url: Url,
    client: Client,
    user_id: String,
    access_token: Option<String>,
}

impl MatrixAdapter {
    /// Create an adapter for `homeserver_url`, acting as `user_id`
    pub fn new(homeserver_url: &str, user_id: impl Into<String>) -> Result<Self, BotError> {
        let base_url = Url::parse(homeserver_url)
            .map_err(|e| BotError::Internal(format!("Invalid homeserver URL {}: {}", homeserver_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BotError::Internal(format!("Invalid homeserver URL {}", homeserver_url)));
        }
        Ok(Self {
            base_url,
            client: Client::new(),
            user_id: user_id.into(),
            access_token: None,
        })
    }

    /// Attach the session credential used for all further calls
    pub fn with_credential(mut self, credential: &Credential) -> Self {
        self.access_token = Some(credential.token().to_string());
        self
    }

    /// Build an API URL; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, BotError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| BotError::Unauthorized("no access token".to_string()))?;
        Ok(request.bearer_auth(token))
    }

    async fn send_request(request: RequestBuilder) -> Result<Response, BotError> {
        let response = request
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error: ApiError = response.json().await.unwrap_or_default();
        Err(map_api_error(status, &error))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, BotError> {
        response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))
    }

    async fn register_request(&self, body: &RegisterRequest<'_>) -> Result<Response, reqwest::Error> {
        self.client
            .post(self.endpoint(&["register"]))
            .query(&[("kind", "user")])
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
    }
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    initial_device_display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<DummyAuth>,
}

#[derive(Serialize)]
struct DummyAuth {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<String>,
}

/// Map a failed response to an error
pub fn map_api_error(status: StatusCode, error: &ApiError) -> BotError {
    let detail = if error.errcode.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("{} ({}): {}", error.errcode, status, error.error)
    };
    match error.errcode.as_str() {
        "M_UNKNOWN_TOKEN" | "M_MISSING_TOKEN" => BotError::Unauthorized(detail),
        "M_FORBIDDEN" | "M_USER_DEACTIVATED" | "M_USER_IN_USE" | "M_EXCLUSIVE" => BotError::Auth(detail),
        _ => BotError::Network(detail),
    }
}

/// Whether a failed login means the account has to be registered first
fn is_unknown_account(status: StatusCode, error: &ApiError) -> bool {
    matches!(error.errcode.as_str(), "M_FORBIDDEN" | "M_NOT_FOUND" | "M_INVALID_USERNAME")
        || (error.errcode.is_empty() && status == StatusCode::FORBIDDEN)
}

/// Turn a sync response into message events, skipping the bot's own
pub fn events_from_sync(response: SyncResponse, own_user_id: &str) -> SyncBatch {
    let mut events = Vec::new();
    for (room_id, room) in response.rooms.join {
        for raw in room.timeline.events {
            if raw.event_type != "m.room.message" || raw.sender == own_user_id {
                continue;
            }
            // Redacted events have no body and are skipped.
            let (Some(msgtype), Some(body)) = (
                raw.content.get("msgtype").and_then(|v| v.as_str()),
                raw.content.get("body").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            let timestamp = DateTime::<Utc>::from_timestamp_millis(raw.origin_server_ts).unwrap_or_else(Utc::now);
            events.push(
                IncomingMessageEvent::new(room_id.clone(), raw.sender, body)
                    .with_kind(MessageKind::from_msgtype(msgtype))
                    .with_event_id(raw.event_id)
                    .with_timestamp(timestamp),
            );
        }
    }
    SyncBatch {
        next_batch: response.next_batch,
        events,
    }
}

#[async_trait]
impl Authenticator for MatrixAdapter {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Credential, BotError> {
        let request = serde_json::json!({
            "type": "m.login.password",
            "identifier": { "type": "m.id.user", "user": username },
            "password": password,
            "initial_device_display_name": DEVICE_NAME,
        });

        let response = self
            .client
            .post(self.endpoint(&["login"]))
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error: ApiError = response.json().await.unwrap_or_default();
            if is_unknown_account(status, &error) {
                return Err(BotError::AccountNotFound(format!("{} {}", error.errcode, error.error)));
            }
            return Err(map_api_error(status, &error));
        }

        let data: LoginResponse = Self::parse(response).await?;
        data.access_token
            .map(Credential::new)
            .ok_or_else(|| BotError::Auth("login returned no access token".to_string()))
    }

    async fn register_account(&self, username: &str, password: &str) -> Result<Credential, BotError> {
        #[derive(Deserialize)]
        struct InteractiveAuth {
            session: Option<String>,
        }

        let mut request = RegisterRequest {
            username,
            password,
            initial_device_display_name: DEVICE_NAME,
            auth: None,
        };

        let response = self
            .register_request(&request)
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        // The first call opens a user-interactive auth session; the dummy
        // stage completes it.
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            let uia: InteractiveAuth = Self::parse(response).await?;
            request.auth = Some(DummyAuth {
                kind: "m.login.dummy",
                session: uia.session,
            });
            self.register_request(&request)
                .await
                .map_err(|e| BotError::Network(e.to_string()))?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let error: ApiError = response.json().await.unwrap_or_default();
            return Err(match map_api_error(status, &error) {
                BotError::Network(detail) => BotError::Auth(format!("registration failed: {}", detail)),
                other => other,
            });
        }

        let data: LoginResponse = Self::parse(response).await?;
        tracing::info!("Registered account {}", username);
        data.access_token
            .map(Credential::new)
            .ok_or_else(|| BotError::Auth("registration returned no access token".to_string()))
    }
}

#[async_trait]
impl Transport for MatrixAdapter {
    async fn join_room(&self, name: &str) -> Result<RoomHandle, BotError> {
        #[derive(Deserialize)]
        struct JoinResponse {
            room_id: String,
        }

        let request = self.authorized(
            self.client
                .post(self.endpoint(&["join", name]))
                .timeout(REQUEST_TIMEOUT)
                .json(&serde_json::json!({})),
        )?;
        let data: JoinResponse = Self::parse(Self::send_request(request).await?).await?;
        Ok(RoomHandle::new(data.room_id, name))
    }

    async fn send_text(&self, room: &RoomHandle, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct TextContent<'a> {
            msgtype: &'static str,
            body: &'a str,
        }

        #[derive(Deserialize)]
        struct SendResponse {
            event_id: String,
        }

        tracing::debug!("Sending to {}: {}", room.name, text);
        let txn_id = uuid::Uuid::new_v4().to_string();
        let request = self.authorized(
            self.client
                .put(self.endpoint(&["rooms", &room.id, "send", "m.room.message", &txn_id]))
                .timeout(REQUEST_TIMEOUT)
                .json(&TextContent { msgtype: "m.text", body: text }),
        )?;
        let data: SendResponse = Self::parse(Self::send_request(request).await?).await?;
        Ok(data.event_id)
    }

    async fn resolve_display_name(&self, user_id: &str) -> Result<String, BotError> {
        #[derive(Deserialize)]
        struct DisplayNameResponse {
            displayname: Option<String>,
        }

        let request = self.authorized(
            self.client
                .get(self.endpoint(&["profile", user_id, "displayname"]))
                .timeout(REQUEST_TIMEOUT),
        )?;
        let response = request
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        // No profile or no display name set: the user id is the name.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(user_id.to_string());
        }
        if !response.status().is_success() {
            let status = response.status();
            let error: ApiError = response.json().await.unwrap_or_default();
            return Err(map_api_error(status, &error));
        }

        let data: DisplayNameResponse = Self::parse(response).await?;
        Ok(data
            .displayname
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user_id.to_string()))
    }

    async fn sync(&self, since: Option<&str>, timeout: Duration) -> Result<SyncBatch, BotError> {
        let mut query = vec![
            ("timeout", timeout.as_millis().to_string()),
            ("filter", SYNC_FILTER.to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }

        let request = self.authorized(
            self.client
                .get(self.endpoint(&["sync"]))
                .query(&query)
                .timeout(timeout + SYNC_GRACE),
        )?;
        let data: SyncResponse = Self::parse(Self::send_request(request).await?).await?;
        Ok(events_from_sync(data, &self.user_id))
    }
}
