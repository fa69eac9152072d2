//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続 → ルームの所属（ブロードキャストグループ）を管理
//! - ドメインイベントを JSON にエンコードして送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! 接続ごとに独立した送信チャンネルと送信タスクを持つため、
//! ホワイトボード専用接続の大量のトラフィックがチャット・ファイル用の接続を詰まらせることはありません。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomEvent, RoomId},
    infrastructure::dto::websocket::ServerEvent,
};

#[derive(Default)]
struct Registry {
    /// 接続中のクライアントの送信チャンネル
    clients: HashMap<ConnectionId, PusherChannel>,
    /// 接続 → 所属ルーム
    memberships: HashMap<ConnectionId, RoomId>,
    /// ルーム → 所属接続
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl Registry {
    fn leave_current_room(&mut self, connection_id: &ConnectionId) {
        if let Some(room_id) = self.memberships.remove(connection_id)
            && let Some(members) = self.rooms.get_mut(&room_id)
        {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
    }
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id.clone(), tx).await;
/// pusher.join_room(&connection_id, &room_id).await;
/// pusher.push_to(&connection_id, &RoomEvent::ChatHistory(vec![])).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    registry: Mutex<Registry>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(event: &RoomEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(event))
            .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut registry = self.registry.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        registry.clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut registry = self.registry.lock().await;
        registry.leave_current_room(connection_id);
        registry.clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn join_room(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        let mut registry = self.registry.lock().await;
        if registry.memberships.get(connection_id) == Some(room_id) {
            return;
        }
        registry.leave_current_room(connection_id);
        registry
            .memberships
            .insert(connection_id.clone(), room_id.clone());
        registry
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
    }

    async fn room_members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        let mut members: Vec<ConnectionId> = registry
            .rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(event)?;
        let registry = self.registry.lock().await;

        if let Some(sender) = registry.clients.get(connection_id) {
            sender
                .send(content)
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed '{}' to connection '{}'", event.name(), connection_id);
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(event)?;
        let registry = self.registry.lock().await;

        for target in targets {
            if let Some(sender) = registry.clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.clone()) {
                    tracing::warn!(
                        "Failed to push '{}' to connection '{}': {}",
                        event.name(),
                        target,
                        e
                    );
                } else {
                    tracing::debug!("Broadcasted '{}' to connection '{}'", event.name(), target);
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    target
                );
            }
        }

        Ok(())
    }
}
