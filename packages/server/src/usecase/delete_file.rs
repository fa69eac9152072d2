//! UseCase: ファイル削除処理
//!
//! 削除は冪等。存在しないファイルの削除もエラーにせず、一覧をそのまま送る。

use std::{sync::Arc, time::Duration};

use crate::domain::{
    ConnectionId, DocumentStore, FileName, MessagePusher, RoomEvent, RoomId, RoomRegistry,
};

use super::{
    error::FileSyncError,
    file_index::{FileIndex, broadcast_files, push_file_error},
    retry::bounded,
};

/// ファイル削除のユースケース
pub struct DeleteFileUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    store_timeout: Duration,
}

impl DeleteFileUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            message_pusher,
            store_timeout,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        file_name: FileName,
    ) -> Result<(), FileSyncError> {
        if let Err(e) = bounded(
            self.store_timeout,
            self.store.delete_file(&room_id, &file_name),
        )
        .await
        {
            tracing::error!(
                "Failed to delete file '{}' in room '{}': {}",
                file_name,
                room_id,
                e
            );
            push_file_error(
                self.message_pusher.as_ref(),
                connection_id,
                "Failed to delete file",
                e.to_string(),
            )
            .await;
            return Err(e.into());
        }
        tracing::info!("File '{}' deleted in room '{}'", file_name, room_id);

        let cached = self
            .registry
            .remove_cached_file(&room_id, &file_name)
            .await;

        if let Err(e) = self
            .message_pusher
            .broadcast_room(&room_id, &RoomEvent::FileDeleted { file_name }, None)
            .await
        {
            tracing::warn!("Failed to broadcast file-deleted to '{}': {}", room_id, e);
        }

        let index = FileIndex::new(
            self.registry.clone(),
            self.store.clone(),
            self.store_timeout,
        );
        broadcast_files(&index, self.message_pusher.as_ref(), &room_id, cached).await;

        Ok(())
    }
}
