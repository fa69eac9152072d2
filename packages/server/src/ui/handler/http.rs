//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{ParticipantDetailDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live rooms held by the room registry
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let summaries = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.room_id.into_string(),
            participants: room
                .participants
                .iter()
                .map(|p| p.username.as_str().to_string())
                .collect(),
            message_count: room.message_count,
        })
        .collect();

    Json(summaries)
}

/// Room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            let room = detail.room;
            Ok(Json(RoomDetailDto {
                id: room.room_id.into_string(),
                participants: room
                    .participants
                    .iter()
                    .map(|p| ParticipantDetailDto {
                        connection_id: p.connection_id.as_str().to_string(),
                        username: p.username.as_str().to_string(),
                    })
                    .collect(),
                message_count: room.message_count,
                files: detail
                    .files
                    .iter()
                    .map(|f| f.file_name.as_str().to_string())
                    .collect(),
                state_version: detail.state_version,
            }))
        }
        Err(GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}
