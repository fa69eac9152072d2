//! UseCase: 退出・切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() / leave_room()
//! - 参加者リストからの削除と、残りの参加者への通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人のルームから 1 人が切断
//! - 正常系：最後の 1 人が切断してルームが破棄される
//! - エッジケース：ホワイトボード専用接続の切断（参加者リストは変化しない）
//! - 異常系：userCount の保存に失敗しても通知は届く

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::{Clock, timestamp_to_rfc3339};

use crate::domain::{
    ChatMessage, ConnectionId, Departure, DocumentStore, Membership, MessagePusher, Participant,
    RoomEvent, RoomId, RoomRegistry, Timestamp,
};

use super::{chat_relay::ChatRelay, retry::bounded};

/// 退出・切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    chat_relay: Arc<ChatRelay>,
    store_timeout: Duration,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        chat_relay: Arc<ChatRelay>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            message_pusher,
            clock,
            chat_relay,
            store_timeout,
        }
    }

    /// 切断を実行
    ///
    /// MessagePusher から登録解除し、`join-room` 済みであればルームから退出させる。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        membership: Option<Membership>,
    ) -> Option<Departure> {
        self.message_pusher.unregister_client(connection_id).await;

        let membership = membership?;
        self.leave_room(connection_id, &membership).await
    }

    /// ルームから退出させ、残りの参加者に通知する
    ///
    /// ホワイトボード専用接続は参加者リストに載っていないため何もしない（`None`）。
    pub async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        membership: &Membership,
    ) -> Option<Departure> {
        let room_id = &membership.room_id;
        if !membership.role.is_primary() {
            tracing::debug!(
                "Whiteboard connection '{}' left room '{}'",
                connection_id,
                room_id
            );
            return None;
        }

        let departure = self.registry.leave(room_id, connection_id).await;
        let Some(participant) = departure.participant.clone() else {
            tracing::debug!(
                "Connection '{}' was not a participant of room '{}'",
                connection_id,
                room_id
            );
            return Some(departure);
        };

        let now = self.clock.now_millis();
        if departure.room_discarded {
            tracing::info!(
                "'{}' left room '{}'. Room is empty and was discarded",
                participant.username,
                room_id
            );
            self.update_user_count(room_id, &departure.remaining, Timestamp::new(now))
                .await;
            return Some(departure);
        }

        tracing::info!(
            "'{}' left room '{}' ({} remaining)",
            participant.username,
            room_id,
            departure.remaining.len()
        );

        self.broadcast(
            room_id,
            RoomEvent::UpdateUserList(departure.remaining.clone()),
        )
        .await;
        self.broadcast(
            room_id,
            RoomEvent::UserLeft {
                username: participant.username.clone(),
            },
        )
        .await;

        self.chat_relay
            .publish(ChatMessage::system(
                room_id.clone(),
                format!("{} left the room", participant.username),
                timestamp_to_rfc3339(now),
            ))
            .await;

        self.update_user_count(room_id, &departure.remaining, Timestamp::new(now))
            .await;

        Some(departure)
    }

    /// 残り人数を保存し、成功したら残りの参加者の接続 ID を通知する（失敗はログのみ）
    async fn update_user_count(
        &self,
        room_id: &RoomId,
        remaining: &[Participant],
        now: Timestamp,
    ) {
        match bounded(
            self.store_timeout,
            self.store.set_user_count(room_id, remaining.len(), now),
        )
        .await
        {
            Ok(()) => {
                let connection_ids = remaining
                    .iter()
                    .map(|participant| participant.connection_id.clone())
                    .collect();
                self.broadcast(room_id, RoomEvent::UsersList(connection_ids))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Failed to update user count for room '{}': {}", room_id, e);
            }
        }
    }

    async fn broadcast(&self, room_id: &RoomId, event: RoomEvent) {
        if let Err(e) = self
            .message_pusher
            .broadcast_room(room_id, &event, None)
            .await
        {
            tracing::warn!(
                "Failed to broadcast {} to room '{}': {}",
                event.name(),
                room_id,
                e
            );
        }
    }
}
