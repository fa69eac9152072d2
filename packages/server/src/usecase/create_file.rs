//! UseCase: ファイル作成処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CreateFileUseCase::execute() メソッド
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成したファイルと更新後の一覧が送信者を含むルーム全体に届く
//! - 異常系：同名ファイルが存在する（送信者だけに file-error）

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::Clock;

use crate::domain::{
    ConnectionId, DocumentStore, FileName, FileRecord, MessagePusher, RoomEvent, RoomId,
    RoomRegistry, Timestamp,
};

use super::{
    error::FileSyncError,
    file_index::{FileIndex, broadcast_files, push_file_error},
    retry::bounded,
};

/// ファイル作成のユースケース
pub struct CreateFileUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl CreateFileUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            message_pusher,
            clock,
            store_timeout,
        }
    }

    /// ファイル作成を実行
    ///
    /// 保存に失敗した場合はルームへのブロードキャストを行わない。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        file_name: FileName,
        content: String,
    ) -> Result<FileRecord, FileSyncError> {
        let record = FileRecord {
            room_id: room_id.clone(),
            file_name,
            content,
            updated_at: Timestamp::new(self.clock.now_millis()),
        };

        let created = match bounded(self.store_timeout, self.store.create_file(record)).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!("Failed to create file in room '{}': {}", room_id, e);
                push_file_error(
                    self.message_pusher.as_ref(),
                    connection_id,
                    "Failed to create file",
                    e.to_string(),
                )
                .await;
                return Err(e.into());
            }
        };
        tracing::info!("File '{}' created in room '{}'", created.file_name, room_id);

        let cached = self
            .registry
            .upsert_cached_file(&room_id, created.clone())
            .await;

        if let Err(e) = self
            .message_pusher
            .broadcast_room(&room_id, &RoomEvent::FileCreated(created.clone()), None)
            .await
        {
            tracing::warn!("Failed to broadcast file-created to '{}': {}", room_id, e);
        }

        let index = FileIndex::new(
            self.registry.clone(),
            self.store.clone(),
            self.store_timeout,
        );
        broadcast_files(&index, self.message_pusher.as_ref(), &room_id, cached).await;

        Ok(created)
    }
}
