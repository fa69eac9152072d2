//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! - `RoomRegistry`: プロセス内のルーム状態（参加者・チャット履歴・ファイル一覧キャッシュ）
//! - `DocumentStore`: 永続化されたホワイトボードとファイル

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::{
    ChatMessage, ConnectionId, FileName, FileRecord, Participant, RoomId, RoomSnapshot,
    StoreError, Timestamp, WhiteboardSnapshot, WhiteboardState,
};

/// 参加処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// 新しく追加されたか（同じ接続の再参加なら `false`）
    pub added: bool,
    /// 参加後の参加者リスト（参加順）
    pub participants: Vec<Participant>,
}

/// 退出処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    /// 退出した参加者（登録されていなかった場合は `None`）
    pub participant: Option<Participant>,
    /// 残りの参加者
    pub remaining: Vec<Participant>,
    /// 参加者がいなくなりルームのエントリが破棄されたか
    pub room_discarded: bool,
}

/// Room Registry trait
///
/// プロセス内でのみ有効なルームの状態を管理する。再起動すると失われる。
/// 各メソッドは単独でアトミックに実行されること。
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// 参加者を追加（`connection_id` が既に登録済みなら何もしない）
    async fn join(&self, room_id: &RoomId, participant: Participant) -> JoinOutcome;

    /// 参加者を削除。参加者が 0 人になったらルームのエントリごと破棄する
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Departure;

    /// 参加者リストを取得（存在しないルームは空）
    async fn participants(&self, room_id: &RoomId) -> Vec<Participant>;

    /// チャット履歴にメッセージを追加
    async fn append_message(&self, room_id: &RoomId, message: ChatMessage);

    /// チャット履歴を取得（存在しないルームは空）
    async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatMessage>;

    /// ファイル一覧のキャッシュを取得（未ロードなら `None`）
    async fn cached_files(&self, room_id: &RoomId) -> Option<Vec<FileRecord>>;

    /// ファイル一覧のキャッシュを置き換える
    async fn replace_cached_files(&self, room_id: &RoomId, files: Vec<FileRecord>);

    /// キャッシュ内のファイルを追加または更新し、更新後の一覧を返す（未ロードなら `None`）
    async fn upsert_cached_file(&self, room_id: &RoomId, file: FileRecord)
    -> Option<Vec<FileRecord>>;

    /// キャッシュからファイルを取り除き、更新後の一覧を返す（未ロードなら `None`）
    async fn remove_cached_file(
        &self,
        room_id: &RoomId,
        file_name: &FileName,
    ) -> Option<Vec<FileRecord>>;

    /// 稼働中の全ルーム
    async fn rooms(&self) -> Vec<RoomSnapshot>;

    /// 指定ルームのスナップショット
    async fn room(&self, room_id: &RoomId) -> Option<RoomSnapshot>;
}

/// Document Store trait
///
/// 外部の永続化層。キーによる検索・作成・更新（upsert）・削除のみを要求する。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// ホワイトボードの状態を取得
    async fn find_whiteboard(&self, room_id: &RoomId)
    -> Result<Option<WhiteboardState>, StoreError>;

    /// ホワイトボードの状態を作成
    async fn create_whiteboard(&self, state: WhiteboardState)
    -> Result<WhiteboardState, StoreError>;

    /// スナップショットを書き込み、バージョンをアトミックに 1 進める
    ///
    /// 存在しない場合はバージョン 1 で作成する。
    async fn upsert_whiteboard(
        &self,
        room_id: &RoomId,
        snapshot: WhiteboardSnapshot,
        now: Timestamp,
    ) -> Result<WhiteboardState, StoreError>;

    /// 参加人数を更新（存在しない場合は何もしない）
    async fn set_user_count(
        &self,
        room_id: &RoomId,
        user_count: usize,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// ルームのファイル一覧（作成順）
    async fn list_files(&self, room_id: &RoomId) -> Result<Vec<FileRecord>, StoreError>;

    /// ファイルを作成（同名ファイルが存在すれば `AlreadyExists`）
    async fn create_file(&self, file: FileRecord) -> Result<FileRecord, StoreError>;

    /// ファイルを削除（存在しなくてもエラーにしない）
    async fn delete_file(&self, room_id: &RoomId, file_name: &FileName)
    -> Result<(), StoreError>;

    /// ファイルを更新（存在しなければ作成）
    async fn upsert_file(
        &self,
        room_id: &RoomId,
        file_name: &FileName,
        content: String,
        now: Timestamp,
    ) -> Result<FileRecord, StoreError>;
}
