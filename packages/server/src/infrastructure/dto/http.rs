//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Room summary for `GET /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    /// Usernames of the primary connections, in join order
    pub participants: Vec<String>,
    pub message_count: usize,
}

/// Participant entry in a room detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    #[serde(rename = "socketId")]
    pub connection_id: String,
    pub username: String,
}

/// Room detail for `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub message_count: usize,
    /// File names in creation order
    pub files: Vec<String>,
    /// Persisted whiteboard version, `null` when no snapshot exists
    pub state_version: Option<u64>,
}
