//! UseCase のテスト用ヘルパー

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::FixedClock;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, MessagePusher, Participant, RoomId, RoomRegistry, Username},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryDocumentStore, InMemoryRoomRegistry},
    },
};

use super::{
    ChatRelay, DisconnectParticipantUseCase, JoinRoomUseCase, RetryPolicy,
    UpdateWhiteboardUseCase,
};

pub(crate) const NOW: i64 = 1_672_531_200_000;
pub(crate) const STORE_TIMEOUT: Duration = Duration::from_secs(1);

/// テスト用のリトライ方針（3 回・1ms 間隔）
pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub(crate) fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub(crate) fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub(crate) fn user(name: &str) -> Username {
    Username::new(name.to_string()).unwrap()
}

/// テスト用の依存一式
pub(crate) struct Harness {
    pub registry: Arc<InMemoryRoomRegistry>,
    pub store: Arc<InMemoryDocumentStore>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            registry: Arc::new(InMemoryRoomRegistry::new()),
            store: Arc::new(InMemoryDocumentStore::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    pub(crate) fn chat_relay(&self) -> Arc<ChatRelay> {
        Arc::new(ChatRelay::new(self.registry.clone(), self.pusher.clone()))
    }

    pub(crate) fn disconnect_usecase(&self) -> Arc<DisconnectParticipantUseCase> {
        Arc::new(DisconnectParticipantUseCase::new(
            self.registry.clone(),
            self.store.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.chat_relay(),
            STORE_TIMEOUT,
        ))
    }

    pub(crate) fn join_usecase(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.registry.clone(),
            self.store.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.chat_relay(),
            self.disconnect_usecase(),
            STORE_TIMEOUT,
        )
    }

    pub(crate) fn update_whiteboard_usecase(&self) -> UpdateWhiteboardUseCase {
        UpdateWhiteboardUseCase::new(
            self.store.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            fast_retry(),
            STORE_TIMEOUT,
        )
    }

    /// 接続を登録し、ルームのブロードキャストグループに加える
    pub(crate) async fn connect(&self, connection: &str, room_id: &str) -> TestClient {
        let client = self.connect_only(connection).await;
        self.pusher.join_room(&client.id, &room(room_id)).await;
        client
    }

    /// 参加者リストに直接登録する（通知は行わない）
    pub(crate) async fn seat(&self, connection: &str, room_id: &str, name: &str) {
        self.registry
            .join(&room(room_id), Participant::new(conn(connection), user(name)))
            .await;
    }

    /// 接続の登録だけを行う（ルームには参加しない）
    pub(crate) async fn connect_only(&self, connection: &str) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(conn(connection), tx).await;
        TestClient {
            id: conn(connection),
            rx,
        }
    }
}

/// 受信したイベントを検査するためのクライアント
pub(crate) struct TestClient {
    pub id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
}

impl TestClient {
    /// これまでに届いたイベントを全て取り出す
    pub(crate) fn drain(&mut self) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            events.push(serde_json::from_str(&raw).unwrap());
        }
        events
    }

    /// これまでに届いたイベント名を全て取り出す
    pub(crate) fn event_names(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|event| event["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// イベント名で検索
pub(crate) fn find<'a>(events: &'a [Value], name: &str) -> Option<&'a Value> {
    events.iter().find(|event| event["event"] == name)
}
