//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 初期状態の送信（init-state / files-list-updated / chat-history）と参加通知
//!
//! ### なぜこのテストが必要か
//! - 同じ接続の再参加で参加者が重複しないことを保証
//! - DocumentStore の障害時にも参加者へ初期状態が届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加でホワイトボードが作成される
//! - 正常系：既存のファイル一覧・チャット履歴が送られる
//! - エッジケース：同じ接続 ID での再参加、ホワイトボード専用接続、別ルームへの移動
//! - 異常系：DocumentStore の障害（フォールバックの初期状態を送る）

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::{Clock, timestamp_to_rfc3339};

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRole, DocumentStore, Membership, MessagePusher,
    Participant, RoomEvent, RoomId, RoomRegistry, StoreError, Timestamp, Username,
    WhiteboardSnapshot, WhiteboardState,
};

use super::{
    chat_relay::ChatRelay, disconnect_participant::DisconnectParticipantUseCase,
    file_index::FileIndex, retry::bounded,
};

/// `join-room` の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRoomCommand {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub username: Username,
    pub role: ConnectionRole,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    chat_relay: Arc<ChatRelay>,
    disconnect: Arc<DisconnectParticipantUseCase>,
    store_timeout: Duration,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        chat_relay: Arc<ChatRelay>,
        disconnect: Arc<DisconnectParticipantUseCase>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            message_pusher,
            clock,
            chat_relay,
            disconnect,
            store_timeout,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `command` - 参加する接続・ルーム・ユーザー名・接続の役割
    /// * `previous` - この接続の現在の所属（別ルームなら先に退出処理を行う）
    ///
    /// # Returns
    ///
    /// 切断時に使う所属情報
    pub async fn execute(
        &self,
        command: JoinRoomCommand,
        previous: Option<&Membership>,
    ) -> Membership {
        let JoinRoomCommand {
            connection_id,
            room_id,
            username,
            role,
        } = command;

        // 1. ブロードキャストグループを移動してから、前の所属の退出処理を行う
        //    同じルームでも役割が変わる場合は前の所属から退出する
        self.message_pusher
            .join_room(&connection_id, &room_id)
            .await;
        if let Some(previous) = previous
            && (previous.room_id != room_id || previous.role != role)
        {
            tracing::info!(
                "Connection '{}' moves from room '{}' ({:?}) to '{}' ({:?})",
                connection_id,
                previous.room_id,
                previous.role,
                room_id,
                role
            );
            self.disconnect.leave_room(&connection_id, previous).await;
        }

        // 2. 参加者リストへの登録（ホワイトボード専用接続は登録しない）
        let (added, participants) = if role.is_primary() {
            let outcome = self
                .registry
                .join(
                    &room_id,
                    Participant::new(connection_id.clone(), username.clone()),
                )
                .await;
            (outcome.added, outcome.participants)
        } else {
            (false, self.registry.participants(&room_id).await)
        };
        tracing::info!(
            "'{}' joined room '{}' as {:?} connection ({} participant(s))",
            username,
            room_id,
            role,
            participants.len()
        );

        // 3. ホワイトボードの初期状態を参加者本人に送る
        let snapshot = self.load_whiteboard(&room_id, participants.len()).await;
        self.push(&connection_id, RoomEvent::InitState(snapshot))
            .await;

        if role.is_primary() {
            // 4. ファイル一覧とチャット履歴を参加者本人に送る
            let files = match self.file_index().load(&room_id).await {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!("Failed to load files for room '{}': {}", room_id, e);
                    Vec::new()
                }
            };
            self.push(&connection_id, RoomEvent::FilesListUpdated(files))
                .await;

            let history = self.registry.chat_history(&room_id).await;
            self.push(&connection_id, RoomEvent::ChatHistory(history))
                .await;

            // 5. ルームへの通知
            if added {
                self.broadcast(
                    &room_id,
                    RoomEvent::UserJoined {
                        username: username.clone(),
                    },
                    Some(&connection_id),
                )
                .await;
            }
            self.broadcast(&room_id, RoomEvent::UpdateUserList(participants), None)
                .await;
            if added {
                self.chat_relay
                    .publish(ChatMessage::system(
                        room_id.clone(),
                        format!("{} joined the room", username),
                        timestamp_to_rfc3339(self.clock.now_millis()),
                    ))
                    .await;
            }
        }

        Membership {
            room_id,
            username,
            role,
        }
    }

    /// ホワイトボードの状態を取得し、無ければ作成する
    ///
    /// DocumentStore が使えない場合は空のスナップショットを返す。
    async fn load_whiteboard(&self, room_id: &RoomId, user_count: usize) -> WhiteboardSnapshot {
        match bounded(self.store_timeout, self.store.find_whiteboard(room_id)).await {
            Ok(Some(state)) => return state.snapshot,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to load whiteboard for room '{}': {}", room_id, e);
                return WhiteboardSnapshot::fallback();
            }
        }

        let now = Timestamp::new(self.clock.now_millis());
        let initial = WhiteboardState::initial(room_id.clone(), user_count, now);
        match bounded(self.store_timeout, self.store.create_whiteboard(initial)).await {
            Ok(state) => {
                tracing::info!("Created whiteboard for room '{}'", room_id);
                state.snapshot
            }
            // 同時に参加した別の接続が先に作成した
            Err(StoreError::AlreadyExists(_)) => {
                match bounded(self.store_timeout, self.store.find_whiteboard(room_id)).await {
                    Ok(Some(state)) => state.snapshot,
                    Ok(None) => WhiteboardSnapshot::fallback(),
                    Err(e) => {
                        tracing::warn!("Failed to reload whiteboard for room '{}': {}", room_id, e);
                        WhiteboardSnapshot::fallback()
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to create whiteboard for room '{}': {}", room_id, e);
                WhiteboardSnapshot::fallback()
            }
        }
    }

    fn file_index(&self) -> FileIndex {
        FileIndex::new(
            self.registry.clone(),
            self.store.clone(),
            self.store_timeout,
        )
    }

    async fn push(&self, connection_id: &ConnectionId, event: RoomEvent) {
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!(
                "Failed to push {} to '{}': {}",
                event.name(),
                connection_id,
                e
            );
        }
    }

    async fn broadcast(&self, room_id: &RoomId, event: RoomEvent, exclude: Option<&ConnectionId>) {
        if let Err(e) = self
            .message_pusher
            .broadcast_room(room_id, &event, exclude)
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
