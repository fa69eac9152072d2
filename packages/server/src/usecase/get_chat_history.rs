//! UseCase: チャット履歴の取得
//!
//! 存在しないルームの履歴は空として扱います。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomEvent, RoomId, RoomRegistry};

use super::error::ChatHistoryError;

pub struct GetChatHistoryUseCase {
    registry: Arc<dyn RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetChatHistoryUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// 履歴を要求した接続にだけ送る。送った件数を返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<usize, ChatHistoryError> {
        let history = self.registry.chat_history(room_id).await;
        let count = history.len();
        self.message_pusher
            .push_to(connection_id, &RoomEvent::ChatHistory(history))
            .await
            .map_err(|e| ChatHistoryError::PushFailed(e.to_string()))?;
        Ok(count)
    }
}
