//! ルームのファイル一覧（Room Registry のキャッシュ + DocumentStore）

use std::{sync::Arc, time::Duration};

use crate::domain::{
    ConnectionId, DocumentStore, FileRecord, MessagePusher, RoomEvent, RoomId, RoomRegistry,
    StoreError,
};

use super::retry::bounded;

/// ファイル一覧の読み出し
///
/// キャッシュは参加時にだけ作られる。参加者のいないルームに対するファイル操作では
/// キャッシュを作らず、DocumentStore の一覧をそのまま使う。
pub(crate) struct FileIndex {
    registry: Arc<dyn RoomRegistry>,
    store: Arc<dyn DocumentStore>,
    store_timeout: Duration,
}

impl FileIndex {
    pub(crate) fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            store_timeout,
        }
    }

    /// キャッシュがあればそれを返し、無ければ DocumentStore から読み込んでキャッシュする
    pub(crate) async fn load(&self, room_id: &RoomId) -> Result<Vec<FileRecord>, StoreError> {
        if let Some(files) = self.registry.cached_files(room_id).await {
            return Ok(files);
        }

        let files = bounded(self.store_timeout, self.store.list_files(room_id)).await?;
        self.registry
            .replace_cached_files(room_id, files.clone())
            .await;
        tracing::debug!(
            "Loaded {} file(s) for room '{}' into the cache",
            files.len(),
            room_id
        );
        Ok(files)
    }

    /// 変更後のキャッシュ（`cached`）が無ければ DocumentStore の一覧を返す
    pub(crate) async fn refreshed(
        &self,
        room_id: &RoomId,
        cached: Option<Vec<FileRecord>>,
    ) -> Result<Vec<FileRecord>, StoreError> {
        match cached {
            Some(files) => Ok(files),
            None => bounded(self.store_timeout, self.store.list_files(room_id)).await,
        }
    }
}

/// ファイル操作の失敗を送信者だけに通知する
pub(crate) async fn push_file_error(
    message_pusher: &dyn MessagePusher,
    connection_id: &ConnectionId,
    error: &str,
    details: String,
) {
    let event = RoomEvent::FileError {
        error: error.to_string(),
        details,
    };
    if let Err(e) = message_pusher.push_to(connection_id, &event).await {
        tracing::warn!("Failed to push file-error to '{}': {}", connection_id, e);
    }
}

/// 更新後のファイル一覧をルーム全体に送る（取得に失敗したら送らない）
pub(crate) async fn broadcast_files(
    index: &FileIndex,
    message_pusher: &dyn MessagePusher,
    room_id: &RoomId,
    cached: Option<Vec<FileRecord>>,
) {
    let files = match index.refreshed(room_id, cached).await {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("Failed to list files for room '{}': {}", room_id, e);
            return;
        }
    };
    if let Err(e) = message_pusher
        .broadcast_room(room_id, &RoomEvent::FilesListUpdated(files), None)
        .await
    {
        tracing::warn!("Failed to broadcast file list to '{}': {}", room_id, e);
    }
}
