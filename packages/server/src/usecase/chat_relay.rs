//! チャットの追記とブロードキャスト
//!
//! ユーザーメッセージも入退室のシステムメッセージも同じ経路を通すことで、
//! ルーム内での順序が保たれます。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessagePusher, RoomEvent, RoomRegistry};

pub struct ChatRelay {
    registry: Arc<dyn RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    /// 履歴への追記と配信を 1 つの単位として直列化する
    publish_lock: Mutex<()>,
}

impl ChatRelay {
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
            publish_lock: Mutex::new(()),
        }
    }

    /// 履歴に追記し、ルーム全体に `receive-message` を送る
    ///
    /// 配信順は履歴の順序と一致する。
    pub async fn publish(&self, message: ChatMessage) {
        let room_id = message.room_id.clone();
        let _guard = self.publish_lock.lock().await;
        self.registry.append_message(&room_id, message.clone()).await;

        if let Err(e) = self
            .message_pusher
            .broadcast_room(&room_id, &RoomEvent::ReceiveMessage(message), None)
            .await
        {
            tracing::warn!("Failed to broadcast chat message to '{}': {}", room_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MessageKind,
        usecase::test_support::{Harness, room},
    };
    use serde_json::json;

    fn message(text: String) -> ChatMessage {
        ChatMessage {
            kind: Some(MessageKind::User),
            username: "alice".to_string(),
            text,
            timestamp: json!("T"),
            room_id: room("r1"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_are_delivered_in_history_order() {
        // テスト項目: 並行に送られたメッセージの配信順が履歴の順序と一致する
        // given (前提条件):
        let harness = Harness::new();
        let relay = harness.chat_relay();
        let mut bob = harness.connect("b", "r1").await;
        harness.seat("b", "r1", "bob").await;

        // when (操作):
        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let relay = relay.clone();
                tokio::spawn(async move { relay.publish(message(format!("m{i}"))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        let history: Vec<String> = harness
            .registry
            .chat_history(&room("r1"))
            .await
            .into_iter()
            .map(|m| m.text)
            .collect();
        let delivered: Vec<String> = bob
            .drain()
            .into_iter()
            .map(|event| event["data"]["text"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(history.len(), 50);
        assert_eq!(delivered, history);
    }

    #[tokio::test]
    async fn test_publish_to_room_without_participants_is_not_kept() {
        // テスト項目: 参加者のいないルームへのメッセージは配信されるが履歴は残らず、ルームも作られない
        // given (前提条件):
        let harness = Harness::new();
        let relay = harness.chat_relay();
        let mut board = harness.connect("b-board", "r1").await;

        // when (操作):
        relay.publish(message("hi".to_string())).await;

        // then (期待する結果):
        assert_eq!(board.event_names(), vec!["receive-message"]);
        assert!(harness.registry.chat_history(&room("r1")).await.is_empty());
        assert!(harness.registry.rooms().await.is_empty());
    }
}
