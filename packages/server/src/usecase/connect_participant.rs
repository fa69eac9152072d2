//! UseCase: 接続処理
//!
//! 接続 ID をサーバー側で払い出し、MessagePusher に登録して `connected` を通知します。
//! ルームへの参加は `join-room` を受け取るまで行いません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RoomEvent};

/// 接続のユースケース
pub struct ConnectParticipantUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 接続を登録し、払い出した接続 ID を返す
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        let event = RoomEvent::Connected {
            connection_id: connection_id.clone(),
        };
        if let Err(e) = self.message_pusher.push_to(&connection_id, &event).await {
            tracing::warn!("Failed to send connected event to '{}': {}", connection_id, e);
        }

        connection_id
    }
}
