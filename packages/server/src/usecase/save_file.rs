//! UseCase: ファイル保存処理
//!
//! `file-updated` を受けて upsert し、保存済みの内容を送信者以外に送ります。
//! 送信者は既に同じ内容を持っているため送り返しません。

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::Clock;

use crate::domain::{
    ConnectionId, DocumentStore, FileName, FileRecord, MessagePusher, RoomEvent, RoomId,
    RoomRegistry, Timestamp,
};

use super::{error::FileSyncError, file_index::push_file_error, retry::bounded};

/// ファイル保存のユースケース
pub struct SaveFileUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl SaveFileUseCase {
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

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        file_name: FileName,
        content: String,
    ) -> Result<FileRecord, FileSyncError> {
        let now = Timestamp::new(self.clock.now_millis());
        let saved = match bounded(
            self.store_timeout,
            self.store.upsert_file(&room_id, &file_name, content, now),
        )
        .await
        {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!(
                    "Failed to save file '{}' in room '{}': {}",
                    file_name,
                    room_id,
                    e
                );
                push_file_error(
                    self.message_pusher.as_ref(),
                    connection_id,
                    "Failed to save file",
                    e.to_string(),
                )
                .await;
                return Err(e.into());
            }
        };
        tracing::debug!("File '{}' saved in room '{}'", file_name, room_id);

        self.registry
            .upsert_cached_file(&room_id, saved.clone())
            .await;

        if let Err(e) = self
            .message_pusher
            .broadcast_room(
                &room_id,
                &RoomEvent::FileUpdated(saved.clone()),
                Some(connection_id),
            )
            .await
        {
            tracing::warn!("Failed to broadcast file-updated to '{}': {}", room_id, e);
        }

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockDocumentStore, StoreError},
        usecase::test_support::{Harness, STORE_TIMEOUT, conn, find, room},
    };

    fn usecase(harness: &Harness) -> SaveFileUseCase {
        SaveFileUseCase::new(
            harness.registry.clone(),
            harness.store.clone(),
            harness.pusher.clone(),
            harness.clock.clone(),
            STORE_TIMEOUT,
        )
    }

    fn name(value: &str) -> FileName {
        FileName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_save_creates_missing_file_and_notifies_others() {
        // テスト項目: 存在しないファイルの保存は作成になり、送信者以外に file-updated が届く
        // given (前提条件):
        let harness = Harness::new();
        let usecase = usecase(&harness);
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        usecase
            .execute(&conn("a"), room("r1"), name("a.js"), "let x;".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(alice.drain().is_empty());
        let events = bob.drain();
        let updated = find(&events, "file-updated").unwrap();
        assert_eq!(updated["data"]["fileName"], "a.js");
        assert_eq!(updated["data"]["content"], "let x;");

        let files = harness.store.list_files(&room("r1")).await.unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_save_updates_loaded_cache() {
        // テスト項目: 読み込み済みのキャッシュの内容が保存後の内容に置き換わる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = usecase(&harness);
        let _alice = harness.connect("a", "r1").await;
        usecase
            .execute(&conn("a"), room("r1"), name("a.js"), "v1".to_string())
            .await
            .unwrap();
        harness.seat("a", "r1", "alice").await;
        let files = harness.store.list_files(&room("r1")).await.unwrap();
        harness.registry.replace_cached_files(&room("r1"), files).await;

        // when (操作):
        usecase
            .execute(&conn("a"), room("r1"), name("a.js"), "v2".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let cached = harness.registry.cached_files(&room("r1")).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].content, "v2");
    }

    #[tokio::test]
    async fn test_save_failure_reports_error_to_sender_only() {
        // テスト項目: 保存に失敗したら送信者だけに file-error が届く
        // given (前提条件):
        let harness = Harness::new();
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert_file()
            .times(1)
            .returning(|_, _, _, _| Err(StoreError::Timeout(5000)));
        let usecase = SaveFileUseCase::new(
            harness.registry.clone(),
            Arc::new(store),
            harness.pusher.clone(),
            harness.clock.clone(),
            STORE_TIMEOUT,
        );
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        let result = usecase
            .execute(&conn("a"), room("r1"), name("a.js"), "x".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(FileSyncError::Store(StoreError::Timeout(5000))));
        let events = alice.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data"]["error"], "Failed to save file");
        assert!(bob.drain().is_empty());
    }
}
