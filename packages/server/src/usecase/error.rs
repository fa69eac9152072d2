//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{StoreError, ValueObjectError};

/// ホワイトボード更新のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateWhiteboardError {
    /// 受信した状態が不正（ブロードキャストも永続化もしない）
    #[error("invalid whiteboard state: {0}")]
    InvalidState(#[from] ValueObjectError),

    /// リトライしても保存できなかった
    #[error("failed to persist whiteboard state: {0}")]
    PersistFailed(#[source] StoreError),
}

/// ファイル同期（作成・削除・保存）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSyncError {
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// `chat-notification` の送信に失敗（履歴への追記と `receive-message` は完了している）
    #[error("failed to broadcast chat notification: {0}")]
    NotificationFailed(String),
}

/// チャット履歴取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatHistoryError {
    #[error("failed to push chat history: {0}")]
    PushFailed(String),
}
