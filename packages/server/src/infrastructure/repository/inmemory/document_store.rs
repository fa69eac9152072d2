//! InMemory Document Store 実装
//!
//! ホワイトボードとファイルをプロセス内のマップに保持する DocumentStore 実装。
//! 外部データベースを接続するまでの開発用・テスト用の永続化層です。
//!
//! `upsert_whiteboard` はロックを保持したまま読み込み → 書き込みを行うため、
//! バージョンの加算はアトミックになります（後勝ち）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    DocumentStore, FileName, FileRecord, RoomId, StoreError, Timestamp, WhiteboardSnapshot,
    WhiteboardState,
};

/// インメモリ Document Store 実装
#[derive(Default)]
pub struct InMemoryDocumentStore {
    whiteboards: Mutex<HashMap<RoomId, WhiteboardState>>,
    /// ルームごとのファイル（作成順）
    files: Mutex<HashMap<RoomId, Vec<FileRecord>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_whiteboard(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<WhiteboardState>, StoreError> {
        let whiteboards = self.whiteboards.lock().await;
        Ok(whiteboards.get(room_id).cloned())
    }

    async fn create_whiteboard(
        &self,
        state: WhiteboardState,
    ) -> Result<WhiteboardState, StoreError> {
        let mut whiteboards = self.whiteboards.lock().await;
        if whiteboards.contains_key(&state.room_id) {
            return Err(StoreError::AlreadyExists(state.room_id.into_string()));
        }
        whiteboards.insert(state.room_id.clone(), state.clone());
        Ok(state)
    }

    async fn upsert_whiteboard(
        &self,
        room_id: &RoomId,
        snapshot: WhiteboardSnapshot,
        now: Timestamp,
    ) -> Result<WhiteboardState, StoreError> {
        let mut whiteboards = self.whiteboards.lock().await;
        let state = match whiteboards.get_mut(room_id) {
            Some(existing) => {
                existing.snapshot = snapshot;
                existing.last_update = now;
                existing.state_version += 1;
                existing.clone()
            }
            None => {
                let created = WhiteboardState {
                    room_id: room_id.clone(),
                    snapshot,
                    state_version: 1,
                    user_count: 0,
                    last_update: now,
                };
                whiteboards.insert(room_id.clone(), created.clone());
                created
            }
        };
        Ok(state)
    }

    async fn set_user_count(
        &self,
        room_id: &RoomId,
        user_count: usize,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut whiteboards = self.whiteboards.lock().await;
        if let Some(state) = whiteboards.get_mut(room_id) {
            state.user_count = user_count;
            state.last_update = now;
        }
        Ok(())
    }

    async fn list_files(&self, room_id: &RoomId) -> Result<Vec<FileRecord>, StoreError> {
        let files = self.files.lock().await;
        Ok(files.get(room_id).cloned().unwrap_or_default())
    }

    async fn create_file(&self, file: FileRecord) -> Result<FileRecord, StoreError> {
        let mut files = self.files.lock().await;
        let room_files = files.entry(file.room_id.clone()).or_default();
        if room_files.iter().any(|f| f.file_name == file.file_name) {
            return Err(StoreError::AlreadyExists(file.file_name.into_string()));
        }
        room_files.push(file.clone());
        Ok(file)
    }

    async fn delete_file(&self, room_id: &RoomId, file_name: &FileName) -> Result<(), StoreError> {
        let mut files = self.files.lock().await;
        if let Some(room_files) = files.get_mut(room_id) {
            room_files.retain(|f| &f.file_name != file_name);
        }
        Ok(())
    }

    async fn upsert_file(
        &self,
        room_id: &RoomId,
        file_name: &FileName,
        content: String,
        now: Timestamp,
    ) -> Result<FileRecord, StoreError> {
        let mut files = self.files.lock().await;
        let room_files = files.entry(room_id.clone()).or_default();
        match room_files.iter_mut().find(|f| &f.file_name == file_name) {
            Some(existing) => {
                existing.content = content;
                existing.updated_at = now;
                Ok(existing.clone())
            }
            None => {
                let created = FileRecord {
                    room_id: room_id.clone(),
                    file_name: file_name.clone(),
                    content,
                    updated_at: now,
                };
                room_files.push(created.clone());
                Ok(created)
            }
        }
    }
}
