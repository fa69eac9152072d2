//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("connection id must not be empty")]
    EmptyConnectionId,

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("file name must not be empty")]
    EmptyFileName,

    /// ホワイトボードの `store` がオブジェクトではない
    #[error("whiteboard store must be an object, got {0}")]
    InvalidWhiteboardStore(String),
}

/// ドキュメントストア（永続化層）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 呼び出しが制限時間内に完了しなかった
    #[error("document store call timed out after {0} ms")]
    Timeout(u64),

    /// 同時書き込みによる競合
    #[error("write conflict: {0}")]
    WriteConflict(String),

    /// 一時的に利用できない（接続断など）
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// 一意キー `(roomId, fileName)` の重複
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{0}' not found")]
    NotFound(String),
}

impl StoreError {
    /// リトライで回復しうるエラーかどうか
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::WriteConflict(_) | Self::Unavailable(_)
        )
    }
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode event: {0}")]
    EncodeFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_transient_classification() {
        // テスト項目: タイムアウト・競合・接続断のみが一時的エラーとして扱われる
        // given (前提条件):
        let transient = [
            StoreError::Timeout(5000),
            StoreError::WriteConflict("busy".to_string()),
            StoreError::Unavailable("down".to_string()),
        ];
        let permanent = [
            StoreError::AlreadyExists("a.js".to_string()),
            StoreError::NotFound("r1".to_string()),
        ];

        // when (操作) / then (期待する結果):
        assert!(transient.iter().all(StoreError::is_transient));
        assert!(!permanent.iter().any(StoreError::is_transient));
    }
}
