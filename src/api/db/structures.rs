use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::models::{
    chats, contacts, instances, integration_sessions, media, messages,
};

// --- Query params ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ChatListQuery {
    pub instance_id: Option<String>,
    /// Case-insensitive substring over chat name and remote JID.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ContactListQuery {
    pub instance_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MediaQuery {
    pub message_id: Option<String>,
    /// Comma-separated list, alternative to `messageId`.
    pub message_ids: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSessionQuery {
    pub id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MessageListQuery {
    pub instance_id: Option<String>,
    pub remote_jid: Option<String>,
    /// Comma-separated list, alternative to `remoteJid`.
    pub remote_jids: Option<String>,
    /// Shorthand for `limit`: the newest N rows.
    pub recent: Option<u64>,
    /// `asc` or `desc` (default) on the message timestamp.
    pub order: Option<String>,
    pub limit: Option<u64>,
    /// Exclusive epoch-seconds cursor: only rows strictly older than this.
    pub before: Option<i64>,
}

// --- Mutation payloads ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatAiUpdate {
    pub id: String,
    pub enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatUnreadUpdate {
    pub instance_id: String,
    pub remote_jid: String,
    pub unread_messages: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagesStatusUpdate {
    pub ids: Vec<String>,
    pub status: String,
}

// --- Responses ---

#[derive(Serialize, ToSchema)]
pub struct ChatListResponse {
    pub chats: Vec<chats::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct ContactListResponse {
    pub contacts: Vec<contacts::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct InstanceListResponse {
    pub instances: Vec<instances::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct MediaListResponse {
    pub media: Vec<media::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct IntegrationSessionResponse {
    pub session: Option<integration_sessions::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<messages::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct AckResponse {
    pub ok: bool,
}
