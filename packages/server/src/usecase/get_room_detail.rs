//! UseCase: ルームの詳細
//!
//! Room Registry の状態に、DocumentStore のファイル一覧とホワイトボードのバージョンを加えます。

use std::{sync::Arc, time::Duration};

use crate::domain::{DocumentStore, FileRecord, RoomId, RoomRegistry, RoomSnapshot};

use super::{error::GetRoomDetailError, retry::bounded};

/// ルームの詳細
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDetail {
    pub room: RoomSnapshot,
    pub files: Vec<FileRecord>,
    /// ホワイトボードが未作成、または取得できなかった場合は `None`
    pub state_version: Option<u64>,
}

pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    store_timeout: Duration,
}

impl GetRoomDetailUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            store_timeout,
        }
    }

    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomDetail, GetRoomDetailError> {
        let room = self
            .registry
            .room(room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)?;

        let files = match room.files.clone() {
            Some(files) => files,
            None => bounded(self.store_timeout, self.store.list_files(room_id))
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Failed to list files for room '{}': {}", room_id, e);
                    Vec::new()
                }),
        };

        let state_version =
            match bounded(self.store_timeout, self.store.find_whiteboard(room_id)).await {
                Ok(state) => state.map(|state| state.state_version),
                Err(e) => {
                    tracing::warn!("Failed to load whiteboard for room '{}': {}", room_id, e);
                    None
                }
            };

        Ok(RoomDetail {
            room,
            files,
            state_version,
        })
    }
}
