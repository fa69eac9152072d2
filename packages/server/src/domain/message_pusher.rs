//! MessagePusher trait 定義
//!
//! クライアントへのイベント通知のインターフェース。
//! ルーム単位のブロードキャストグループ（接続 → ルーム）もここで管理します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomEvent, RoomId};

/// 接続ごとの送信チャンネル（エンコード済み JSON を流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除（所属ルームからも外れる）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 接続をルームのブロードキャストグループに加える
    ///
    /// 接続は同時に 1 つのルームにのみ所属する。別のルームに参加すると移動する。
    async fn join_room(&self, connection_id: &ConnectionId, room_id: &RoomId);

    /// ルームに所属している接続の一覧
    async fn room_members(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信（一部の送信失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// ルーム全体に送信。`exclude` を指定するとその接続を除く
    async fn broadcast_room(
        &self,
        room_id: &RoomId,
        event: &RoomEvent,
        exclude: Option<&ConnectionId>,
    ) -> Result<(), MessagePushError> {
        let targets: Vec<ConnectionId> = self
            .room_members(room_id)
            .await
            .into_iter()
            .filter(|id| Some(id) != exclude)
            .collect();
        self.broadcast(targets, event).await
    }
}
