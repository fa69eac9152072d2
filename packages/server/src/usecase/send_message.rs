//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 履歴への追記、ルーム全体への receive-message、送信者以外への chat-notification
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人のルームでのメッセージ送信
//! - エッジケース：送信者のみが接続している場合（通知対象なし）

use std::sync::Arc;

use crate::domain::{ChatMessage, ConnectionId, MessagePusher, RoomEvent};

use super::{chat_relay::ChatRelay, error::SendMessageError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    chat_relay: Arc<ChatRelay>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    pub fn new(chat_relay: Arc<ChatRelay>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            chat_relay,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ConnectionId>)` - chat-notification を送った接続
    /// * `Err(SendMessageError)` - 通知の送信失敗（メッセージ自体は配信済み）
    pub async fn execute(
        &self,
        from: &ConnectionId,
        message: ChatMessage,
    ) -> Result<Vec<ConnectionId>, SendMessageError> {
        let room_id = message.room_id.clone();
        let notification = RoomEvent::ChatNotification {
            room_id: room_id.clone(),
            username: message.username.clone(),
            text: message.text.clone(),
            timestamp: message.timestamp.clone(),
        };

        // 1. 履歴に追記してルーム全体に配信
        self.chat_relay.publish(message).await;

        // 2. 送信者以外に通知
        let targets: Vec<ConnectionId> = self
            .message_pusher
            .room_members(&room_id)
            .await
            .into_iter()
            .filter(|id| id != from)
            .collect();
        self.message_pusher
            .broadcast(targets.clone(), &notification)
            .await
            .map_err(|e| SendMessageError::NotificationFailed(e.to_string()))?;

        tracing::debug!(
            "Message from '{}' relayed in room '{}' ({} notified)",
            from,
            room_id,
            targets.len()
        );
        Ok(targets)
    }
}
