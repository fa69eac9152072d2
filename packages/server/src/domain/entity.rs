//! エンティティ
//!
//! ルームの参加者・チャットメッセージ・ファイル・ホワイトボードの状態を表現します。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, ConnectionRole, FileName, RoomId, Timestamp, Username},
};

/// ルームの参加者（Primary 接続のみ）
///
/// `connection_id` で一意。同じユーザー名で複数接続することは許可される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub username: Username,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, username: Username) -> Self {
        Self {
            connection_id,
            username,
        }
    }
}

/// `join-room` で確定した接続の所属情報
///
/// 切断時にどのルームから何を取り除くかを決めるために保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub username: Username,
    pub role: ConnectionRole,
}

/// チャットメッセージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    System,
}

/// チャットメッセージ
///
/// ユーザーメッセージの `timestamp` はクライアントが送ってきた値をそのまま保持し、
/// 中継時に書き換えない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 送信者が省略した場合は `None`（ユーザーメッセージとして扱う）
    pub kind: Option<MessageKind>,
    pub username: String,
    pub text: String,
    pub timestamp: Value,
    pub room_id: RoomId,
}

impl ChatMessage {
    pub const SYSTEM_USERNAME: &'static str = "System";

    /// 入退室などのシステムメッセージを生成
    pub fn system(room_id: RoomId, text: String, timestamp: String) -> Self {
        Self {
            kind: Some(MessageKind::System),
            username: Self::SYSTEM_USERNAME.to_string(),
            text,
            timestamp: Value::String(timestamp),
            room_id,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, Some(MessageKind::System))
    }
}

/// ルーム内のファイル（キーは `(room_id, file_name)`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub room_id: RoomId,
    pub file_name: FileName,
    pub content: String,
    pub updated_at: Timestamp,
}

/// ホワイトボード（tldraw）のスナップショット
///
/// `store` と `schema` の中身は解釈しない。`store` がオブジェクトであることだけを保証する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardSnapshot {
    pub store: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub schema: Value,
    /// クライアントが付与したその他のフィールド
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WhiteboardSnapshot {
    /// 受信した JSON を検証してスナップショットに変換
    ///
    /// `store` が存在しない、またはオブジェクトでない場合はエラー。
    pub fn from_value(value: Value) -> Result<Self, ValueObjectError> {
        match value.get("store") {
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(ValueObjectError::InvalidWhiteboardStore(
                    json_kind(other).to_string(),
                ));
            }
            None => {
                return Err(ValueObjectError::InvalidWhiteboardStore(
                    "undefined".to_string(),
                ));
            }
        }
        serde_json::from_value(value)
            .map_err(|e| ValueObjectError::InvalidWhiteboardStore(e.to_string()))
    }

    /// 新規ルーム用の空のスナップショット（tldraw の既定スキーマ付き）
    pub fn initial() -> Self {
        Self {
            store: Map::new(),
            schema: json!({
                "schemaVersion": 1,
                "storeVersion": 4,
                "recordVersions": {
                    "asset": 1,
                    "camera": 1,
                    "document": 1,
                    "instance": 1,
                    "instance_page_state": 1,
                    "page": 1,
                    "shape": 4,
                    "instance_presence": 1,
                    "pointer": 1
                }
            }),
            extra: Map::new(),
        }
    }

    /// ストアが使えない時に送る空の形のスナップショット
    pub fn fallback() -> Self {
        Self {
            store: Map::new(),
            schema: json!({
                "schemaVersion": 1,
                "storeVersion": 4,
                "recordVersions": {}
            }),
            extra: Map::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("store".to_string(), Value::Object(self.store.clone()));
        if !self.schema.is_null() {
            object.insert("schema".to_string(), self.schema.clone());
        }
        Value::Object(object)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 永続化されたホワイトボードの状態（ルームごとに 1 件）
///
/// `state_version` は 1 から始まり、書き込みが受理されるたびに単調増加する。
#[derive(Debug, Clone, PartialEq)]
pub struct WhiteboardState {
    pub room_id: RoomId,
    pub snapshot: WhiteboardSnapshot,
    pub state_version: u64,
    pub user_count: usize,
    pub last_update: Timestamp,
}

impl WhiteboardState {
    /// 初回 `join-room` 時に作成する状態
    pub fn initial(room_id: RoomId, user_count: usize, now: Timestamp) -> Self {
        Self {
            room_id,
            snapshot: WhiteboardSnapshot::initial(),
            state_version: 1,
            user_count,
            last_update: now,
        }
    }
}

/// ルームレジストリが保持するルームの読み取り用スナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub participants: Vec<Participant>,
    pub message_count: usize,
    /// ファイル一覧のキャッシュ（未ロードなら `None`）
    pub files: Option<Vec<FileRecord>>,
}
