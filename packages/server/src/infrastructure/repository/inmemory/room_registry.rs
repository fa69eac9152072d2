//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をルーム ID ごとの状態置き場として使用します。
//!
//! ルームのエントリは最初の参加（またはメッセージ追加）で作られ、
//! 参加者が 0 人になった時点でチャット履歴・ファイルキャッシュごと破棄されます。
//! 将来複数プロセスに分割する場合は、この trait を外部 KVS で実装し直します。

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, Departure, FileName, FileRecord, JoinOutcome, Participant, RoomId,
    RoomRegistry, RoomSnapshot,
};

/// ルーム 1 つ分のプロセス内状態
#[derive(Debug, Default)]
struct RoomEntry {
    participants: Vec<Participant>,
    chat_history: VecDeque<ChatMessage>,
    file_index: Option<Vec<FileRecord>>,
}

impl RoomEntry {
    fn snapshot(&self, room_id: &RoomId) -> RoomSnapshot {
        RoomSnapshot {
            room_id: room_id.clone(),
            participants: self.participants.clone(),
            message_count: self.chat_history.len(),
            files: self.file_index.clone(),
        }
    }
}

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<RoomId, RoomEntry>>,
    /// ルームごとのチャット履歴の上限（`None` は無制限）
    history_limit: Option<usize>,
}

impl InMemoryRoomRegistry {
    /// 履歴の上限なしで作成
    pub fn new() -> Self {
        Self::with_history_limit(None)
    }

    /// チャット履歴の上限を指定して作成（古いものから破棄）
    pub fn with_history_limit(history_limit: Option<usize>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            history_limit: history_limit.filter(|limit| *limit > 0),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn join(&self, room_id: &RoomId, participant: Participant) -> JoinOutcome {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms.entry(room_id.clone()).or_default();

        let added = !entry
            .participants
            .iter()
            .any(|p| p.connection_id == participant.connection_id);
        if added {
            entry.participants.push(participant);
        }

        JoinOutcome {
            added,
            participants: entry.participants.clone(),
        }
    }

    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Departure {
        let mut rooms = self.rooms.lock().await;
        let Some(entry) = rooms.get_mut(room_id) else {
            return Departure {
                participant: None,
                remaining: Vec::new(),
                room_discarded: false,
            };
        };

        let participant = entry
            .participants
            .iter()
            .position(|p| &p.connection_id == connection_id)
            .map(|index| entry.participants.remove(index));
        let remaining = entry.participants.clone();

        let room_discarded = remaining.is_empty();
        if room_discarded {
            rooms.remove(room_id);
            tracing::debug!("Room '{}' is empty and was discarded", room_id);
        }

        Departure {
            participant,
            remaining,
            room_discarded,
        }
    }

    async fn participants(&self, room_id: &RoomId) -> Vec<Participant> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|entry| entry.participants.clone())
            .unwrap_or_default()
    }

    async fn append_message(&self, room_id: &RoomId, message: ChatMessage) {
        let mut rooms = self.rooms.lock().await;
        let Some(entry) = rooms.get_mut(room_id) else {
            tracing::debug!("Room '{}' has no participants; message not kept", room_id);
            return;
        };
        entry.chat_history.push_back(message);

        if let Some(limit) = self.history_limit {
            while entry.chat_history.len() > limit {
                entry.chat_history.pop_front();
            }
        }
    }

    async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|entry| entry.chat_history.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn cached_files(&self, room_id: &RoomId) -> Option<Vec<FileRecord>> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).and_then(|entry| entry.file_index.clone())
    }

    async fn replace_cached_files(&self, room_id: &RoomId, files: Vec<FileRecord>) {
        let mut rooms = self.rooms.lock().await;
        if let Some(entry) = rooms.get_mut(room_id) {
            entry.file_index = Some(files);
        }
    }

    async fn upsert_cached_file(
        &self,
        room_id: &RoomId,
        file: FileRecord,
    ) -> Option<Vec<FileRecord>> {
        let mut rooms = self.rooms.lock().await;
        let files = rooms.get_mut(room_id)?.file_index.as_mut()?;

        match files.iter_mut().find(|f| f.file_name == file.file_name) {
            Some(existing) => *existing = file,
            None => files.push(file),
        }
        Some(files.clone())
    }

    async fn remove_cached_file(
        &self,
        room_id: &RoomId,
        file_name: &FileName,
    ) -> Option<Vec<FileRecord>> {
        let mut rooms = self.rooms.lock().await;
        let files = rooms.get_mut(room_id)?.file_index.as_mut()?;
        files.retain(|f| &f.file_name != file_name);
        Some(files.clone())
    }

    async fn rooms(&self) -> Vec<RoomSnapshot> {
        let rooms = self.rooms.lock().await;
        let mut snapshots: Vec<RoomSnapshot> = rooms
            .iter()
            .map(|(room_id, entry)| entry.snapshot(room_id))
            .collect();
        snapshots.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        snapshots
    }

    async fn room(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|entry| entry.snapshot(room_id))
    }
}
