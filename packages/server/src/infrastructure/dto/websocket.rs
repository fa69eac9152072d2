//! WebSocket event DTOs.
//!
//! Every frame is a JSON text frame shaped as `{"event": "<name>", "data": <payload>}`.
//! Event names and camelCase payload fields follow the CodeUnity front end.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Client -> Server
// ========================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    Update(WhiteboardUpdatePayload),
    FileCreated(FilePayload),
    FileDeleted(FileDeletePayload),
    FileContentChange(FilePayload),
    FileUpdated(FilePayload),
    SendMessage(ChatMessageDto),
    GetChatHistory(ChatHistoryRequest),
}

/// `join-room` accepts either a bare room id (legacy clients) or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JoinRoomPayload {
    Legacy(String),
    Detailed(JoinRoomRequest),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_tldraw_connection: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardUpdatePayload {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub changes: Value,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub room_id: String,
    pub file_name: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeletePayload {
    pub room_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRequest {
    #[serde(default)]
    pub room_id: Option<String>,
}

// ========================================
// Shared
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKindDto {
    User,
    System,
}

/// Chat message as sent by clients and relayed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKindDto>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

// ========================================
// Server -> Client
// ========================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Connected(ConnectedPayload),
    InitState(Value),
    UpdateUserList(Vec<ParticipantInfo>),
    UsersList(Vec<String>),
    UserJoined(UsernamePayload),
    UserLeft(UsernamePayload),
    ChatHistory(Vec<ChatMessageDto>),
    ReceiveMessage(ChatMessageDto),
    ChatNotification(ChatNotificationPayload),
    FilesListUpdated(FilesListPayload),
    FileCreated(FileInfo),
    FileDeleted(FileDeletedPayload),
    FileContentChange(FileContentChangePayload),
    FileUpdated(FileInfo),
    FileError(FileErrorPayload),
    Update(WhiteboardBroadcastPayload),
    TldrawError(WhiteboardErrorPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    #[serde(rename = "socketId")]
    pub connection_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernamePayload {
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatNotificationPayload {
    pub room_id: String,
    pub username: String,
    pub text: String,
    pub timestamp: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub content: String,
    /// RFC 3339 (UTC)
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilesListPayload {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeletedPayload {
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentChangePayload {
    pub file_name: String,
    pub content: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileErrorPayload {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardBroadcastPayload {
    pub changes: Value,
    pub state: Value,
    pub timestamp: Value,
    pub source_id: String,
    pub state_version: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardErrorPayload {
    pub message: String,
    pub room_id: String,
    pub error: String,
    pub should_reload: bool,
}
