//! ルームイベント
//!
//! UseCase 層がクライアントに通知する出来事をドメインの言葉で表現します。
//! ワイヤ形式（JSON）への変換は Infrastructure 層の DTO が担当します。

use serde_json::Value;

use super::{
    entity::{ChatMessage, FileRecord, Participant, WhiteboardSnapshot},
    value_object::{ConnectionId, FileName, RoomId, Timestamp, Username},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// 接続直後に払い出した接続 ID を通知
    Connected { connection_id: ConnectionId },
    /// ホワイトボードの初期状態（参加時・保存失敗からの復旧時）
    InitState(WhiteboardSnapshot),
    /// 参加者リスト
    UpdateUserList(Vec<Participant>),
    /// ルームに残っている接続 ID の一覧
    UsersList(Vec<ConnectionId>),
    UserJoined { username: Username },
    UserLeft { username: Username },
    ChatHistory(Vec<ChatMessage>),
    ReceiveMessage(ChatMessage),
    /// 送信者以外に送るトースト用の軽量通知
    ChatNotification {
        room_id: RoomId,
        username: String,
        text: String,
        timestamp: Value,
    },
    FilesListUpdated(Vec<FileRecord>),
    FileCreated(FileRecord),
    FileDeleted { file_name: FileName },
    /// 永続化しない入力中プレビュー
    FileContentChanged {
        file_name: FileName,
        content: String,
        timestamp: Timestamp,
    },
    FileUpdated(FileRecord),
    FileError { error: String, details: String },
    /// 他の接続からのホワイトボード更新
    WhiteboardUpdated {
        changes: Value,
        snapshot: WhiteboardSnapshot,
        timestamp: Value,
        source_id: ConnectionId,
        state_version: u64,
    },
    /// ホワイトボードの保存失敗（送信元のみに通知）
    WhiteboardError {
        message: String,
        room_id: RoomId,
        error: String,
        should_reload: bool,
    },
}

impl RoomEvent {
    /// ログ出力用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::InitState(_) => "init-state",
            Self::UpdateUserList(_) => "update-user-list",
            Self::UsersList(_) => "users-list",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::ChatHistory(_) => "chat-history",
            Self::ReceiveMessage(_) => "receive-message",
            Self::ChatNotification { .. } => "chat-notification",
            Self::FilesListUpdated(_) => "files-list-updated",
            Self::FileCreated(_) => "file-created",
            Self::FileDeleted { .. } => "file-deleted",
            Self::FileContentChanged { .. } => "file-content-change",
            Self::FileUpdated(_) => "file-updated",
            Self::FileError { .. } => "file-error",
            Self::WhiteboardUpdated { .. } => "update",
            Self::WhiteboardError { .. } => "tldraw-error",
        }
    }
}
