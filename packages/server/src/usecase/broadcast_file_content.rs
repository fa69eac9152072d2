//! UseCase: 入力中のファイル内容の中継
//!
//! 永続化せず、送信者以外にそのまま流します（プレビュー用）。

use std::sync::Arc;

use codeunity_shared::time::Clock;

use crate::domain::{ConnectionId, FileName, MessagePusher, RoomEvent, RoomId, Timestamp};

pub struct BroadcastFileContentUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl BroadcastFileContentUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            message_pusher,
            clock,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        file_name: FileName,
        content: String,
    ) {
        let event = RoomEvent::FileContentChanged {
            file_name,
            content,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };
        if let Err(e) = self
            .message_pusher
            .broadcast_room(room_id, &event, Some(connection_id))
            .await
        {
            tracing::warn!("Failed to relay file content to '{}': {}", room_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::DocumentStore,
        usecase::test_support::{Harness, NOW, conn, room},
    };

    #[tokio::test]
    async fn test_content_change_is_relayed_to_others_without_persisting() {
        // テスト項目: 入力中の内容が送信者以外に届き、DocumentStore には保存されない
        // given (前提条件):
        let harness = Harness::new();
        let usecase = BroadcastFileContentUseCase::new(harness.pusher.clone(), harness.clock.clone());
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;
        let mut carol = harness.connect("c", "r2").await;

        // when (操作):
        usecase
            .execute(
                &conn("a"),
                &room("r1"),
                FileName::new("a.js".to_string()).unwrap(),
                "draft".to_string(),
            )
            .await;

        // then (期待する結果):
        assert!(alice.drain().is_empty());
        assert!(carol.drain().is_empty());
        let events = bob.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "file-content-change");
        assert_eq!(events[0]["data"]["fileName"], "a.js");
        assert_eq!(events[0]["data"]["content"], "draft");
        assert_eq!(events[0]["data"]["timestamp"], NOW);
        assert!(harness.store.list_files(&room("r1")).await.unwrap().is_empty());
    }
}
