//! UseCase: ホワイトボード更新処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateWhiteboardUseCase::execute() メソッド
//! - 検証 → 永続化（一時的なエラーはリトライ）→ 送信者以外へのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 保存に成功した更新だけが他の参加者に届くことを保証
//! - stateVersion が書き込みごとに 1 ずつ増えることを保証
//! - 保存に失敗した送信者が再同期できることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：更新の保存とブロードキャスト
//! - 異常系：一時的なエラーからの回復、リトライの使い切り、リトライしないエラー
//! - エッジケース：不正な store（何もしない）、ホワイトボード未作成のルーム

use std::{sync::Arc, time::Duration};

use codeunity_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    ConnectionId, DocumentStore, MessagePusher, RoomEvent, RoomId, Timestamp, WhiteboardSnapshot,
};

use super::{
    error::UpdateWhiteboardError,
    retry::{RetryPolicy, bounded, retry_transient},
};

const SAVE_FAILED_MESSAGE: &str = "Failed to save drawing";

/// `update` の入力
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateWhiteboardCommand {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    /// クライアントがマージ済みの完全な状態（`store` と `schema`）
    pub state: Value,
    /// 差分（解釈せずにそのまま中継する）
    pub changes: Value,
    /// クライアントのタイムスタンプ（省略時はサーバーの現在時刻）
    pub timestamp: Option<Value>,
}

/// ホワイトボード更新のユースケース
pub struct UpdateWhiteboardUseCase {
    store: Arc<dyn DocumentStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    retry_policy: RetryPolicy,
    store_timeout: Duration,
}

impl UpdateWhiteboardUseCase {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        retry_policy: RetryPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            message_pusher,
            clock,
            retry_policy,
            store_timeout,
        }
    }

    /// ホワイトボード更新を実行
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - 保存後の stateVersion
    /// * `Err(UpdateWhiteboardError::InvalidState)` - `store` がオブジェクトでない（何も送らない）
    /// * `Err(UpdateWhiteboardError::PersistFailed)` - 保存失敗（送信者に tldraw-error を送った）
    pub async fn execute(
        &self,
        command: UpdateWhiteboardCommand,
    ) -> Result<u64, UpdateWhiteboardError> {
        let UpdateWhiteboardCommand {
            connection_id,
            room_id,
            state,
            changes,
            timestamp,
        } = command;

        // 1. 検証
        let snapshot = WhiteboardSnapshot::from_value(state).inspect_err(|e| {
            tracing::warn!(
                "Dropped whiteboard update from '{}' for room '{}': {}",
                connection_id,
                room_id,
                e
            );
        })?;

        // 2. 永続化（一時的なエラーはリトライ）
        let now = self.clock.now_millis();
        let saved = retry_transient(&self.retry_policy, "Whiteboard write", || {
            bounded(
                self.store_timeout,
                self.store
                    .upsert_whiteboard(&room_id, snapshot.clone(), Timestamp::new(now)),
            )
        })
        .await;

        let saved = match saved {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!(
                    "Failed to save whiteboard for room '{}' after retries: {}",
                    room_id,
                    e
                );
                self.recover(&connection_id, &room_id, &e.to_string()).await;
                return Err(UpdateWhiteboardError::PersistFailed(e));
            }
        };

        // 3. 送信者以外にブロードキャスト
        let event = RoomEvent::WhiteboardUpdated {
            changes,
            snapshot,
            timestamp: timestamp.unwrap_or_else(|| Value::from(now)),
            source_id: connection_id.clone(),
            state_version: saved.state_version,
        };
        if let Err(e) = self
            .message_pusher
            .broadcast_room(&room_id, &event, Some(&connection_id))
            .await
        {
            tracing::warn!("Failed to broadcast whiteboard update to '{}': {}", room_id, e);
        }

        tracing::debug!(
            "Whiteboard of room '{}' saved at version {} by '{}'",
            room_id,
            saved.state_version,
            connection_id
        );
        Ok(saved.state_version)
    }

    /// 送信者にエラーを通知し、最後に保存された状態を送り直す（失敗はログのみ）
    async fn recover(&self, connection_id: &ConnectionId, room_id: &RoomId, error: &str) {
        let notice = RoomEvent::WhiteboardError {
            message: SAVE_FAILED_MESSAGE.to_string(),
            room_id: room_id.clone(),
            error: error.to_string(),
            should_reload: true,
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &notice).await {
            tracing::warn!("Failed to notify '{}' of save failure: {}", connection_id, e);
        }

        match bounded(self.store_timeout, self.store.find_whiteboard(room_id)).await {
            Ok(Some(state)) => {
                let event = RoomEvent::InitState(state.snapshot);
                if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
                    tracing::warn!("Failed to resend state to '{}': {}", connection_id, e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch last saved whiteboard for room '{}': {}",
                    room_id,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockDocumentStore, StoreError, ValueObjectError, WhiteboardState},
        usecase::test_support::{Harness, NOW, STORE_TIMEOUT, conn, fast_retry, find, room},
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command(connection: &str, room_id: &str, state: Value) -> UpdateWhiteboardCommand {
        UpdateWhiteboardCommand {
            connection_id: conn(connection),
            room_id: room(room_id),
            state,
            changes: json!({"added": {}}),
            timestamp: Some(json!(12345)),
        }
    }

    fn state_with(shape: &str) -> Value {
        json!({"store": {shape: {"id": shape}}, "schema": {"schemaVersion": 1}})
    }

    fn saved_state(room_id: &RoomId, version: u64) -> WhiteboardState {
        let mut state = WhiteboardState::initial(room_id.clone(), 1, Timestamp::new(NOW));
        state.state_version = version;
        state
    }

    fn usecase_with(harness: &Harness, store: MockDocumentStore) -> UpdateWhiteboardUseCase {
        UpdateWhiteboardUseCase::new(
            Arc::new(store),
            harness.pusher.clone(),
            harness.clock.clone(),
            fast_retry(),
            STORE_TIMEOUT,
        )
    }

    #[tokio::test]
    async fn test_update_is_saved_and_broadcast_to_others() {
        // テスト項目: 更新が保存され、送信者以外に changes・state・sourceId・stateVersion が届く
        // given (前提条件):
        let harness = Harness::new();
        let usecase = harness.update_whiteboard_usecase();
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        let version = usecase
            .execute(command("a", "r1", state_with("shape:1")))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(version, 1);
        assert!(alice.drain().is_empty());

        let events = bob.drain();
        let update = find(&events, "update").unwrap();
        assert_eq!(update["data"]["changes"], json!({"added": {}}));
        assert_eq!(update["data"]["state"]["store"]["shape:1"]["id"], "shape:1");
        assert_eq!(update["data"]["timestamp"], 12345);
        assert_eq!(update["data"]["sourceId"], "a");
        assert_eq!(update["data"]["stateVersion"], 1);
    }

    #[tokio::test]
    async fn test_version_after_n_writes_equals_n() {
        // テスト項目: 未作成のルームに N 回書き込むと stateVersion は N になる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = harness.update_whiteboard_usecase();
        let _alice = harness.connect("a", "r1").await;

        // when (操作):
        let mut last = 0;
        for i in 0..5 {
            last = usecase
                .execute(command("a", "r1", state_with(&format!("shape:{}", i))))
                .await
                .unwrap();
        }

        // then (期待する結果):
        assert_eq!(last, 5);
        let state = harness.store.find_whiteboard(&room("r1")).await.unwrap().unwrap();
        assert_eq!(state.state_version, 5);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        // テスト項目: 後から保存された書き込みの内容とバージョンが最終状態になる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = harness.update_whiteboard_usecase();
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        usecase
            .execute(command("a", "r1", state_with("shape:alice")))
            .await
            .unwrap();
        usecase
            .execute(command("b", "r1", state_with("shape:bob")))
            .await
            .unwrap();

        // then (期待する結果):
        let state = harness.store.find_whiteboard(&room("r1")).await.unwrap().unwrap();
        assert_eq!(state.state_version, 2);
        assert!(state.snapshot.store.contains_key("shape:bob"));
        assert!(!state.snapshot.store.contains_key("shape:alice"));

        // alice は bob の書き込みを受け取り、最終状態に収束する
        let events = alice.drain();
        let update = find(&events, "update").unwrap();
        assert_eq!(update["data"]["stateVersion"], 2);
        assert_eq!(update["data"]["sourceId"], "b");
        let bob_events = bob.drain();
        assert_eq!(find(&bob_events, "update").unwrap()["data"]["stateVersion"], 1);
    }

    #[tokio::test]
    async fn test_invalid_store_is_dropped() {
        // テスト項目: store がオブジェクトでない更新は保存もブロードキャストもされない
        // given (前提条件):
        let harness = Harness::new();
        let usecase = harness.update_whiteboard_usecase();
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        let result = usecase
            .execute(command("a", "r1", json!({"store": "not-an-object"})))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(UpdateWhiteboardError::InvalidState(
                ValueObjectError::InvalidWhiteboardStore("string".to_string())
            ))
        );
        assert!(alice.drain().is_empty());
        assert!(bob.drain().is_empty());
        assert!(harness.store.find_whiteboard(&room("r1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_timestamp_defaults_to_server_time() {
        // テスト項目: timestamp が省略されたらサーバーの現在時刻が使われる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = harness.update_whiteboard_usecase();
        let _alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        usecase
            .execute(UpdateWhiteboardCommand {
                timestamp: None,
                ..command("a", "r1", state_with("shape:1"))
            })
            .await
            .unwrap();

        // then (期待する結果):
        let events = bob.drain();
        assert_eq!(find(&events, "update").unwrap()["data"]["timestamp"], NOW);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        // テスト項目: 一時的なエラーが 2 回続いても 3 回目で保存できればブロードキャストされる
        // given (前提条件):
        let harness = Harness::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert_whiteboard()
            .times(3)
            .returning(move |room_id, _, _| {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(StoreError::Timeout(5000)),
                    1 => Err(StoreError::WriteConflict("version".to_string())),
                    _ => Ok(saved_state(room_id, 4)),
                }
            });
        let usecase = usecase_with(&harness, store);
        let _alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        let result = usecase.execute(command("a", "r1", state_with("shape:1"))).await;

        // then (期待する結果):
        assert_eq!(result, Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let events = bob.drain();
        assert_eq!(find(&events, "update").unwrap()["data"]["stateVersion"], 4);
    }

    #[tokio::test]
    async fn test_exhausted_retries_notify_sender_and_resend_state() {
        // テスト項目: リトライを使い切ったら送信者だけに tldraw-error と最後の保存状態が届く
        // given (前提条件):
        let harness = Harness::new();
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert_whiteboard()
            .times(3)
            .returning(|_, _, _| Err(StoreError::WriteConflict("version".to_string())));
        store
            .expect_find_whiteboard()
            .times(1)
            .returning(|room_id| Ok(Some(saved_state(room_id, 9))));
        let usecase = usecase_with(&harness, store);
        let mut alice = harness.connect("a", "r1").await;
        let mut bob = harness.connect("b", "r1").await;

        // when (操作):
        let result = usecase.execute(command("a", "r1", state_with("shape:1"))).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(UpdateWhiteboardError::PersistFailed(StoreError::WriteConflict(_)))
        ));
        assert!(bob.drain().is_empty());

        let events = alice.drain();
        let names: Vec<&str> = events
            .iter()
            .map(|e| e["event"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["tldraw-error", "init-state"]);
        let error = find(&events, "tldraw-error").unwrap();
        assert_eq!(error["data"]["message"], "Failed to save drawing");
        assert_eq!(error["data"]["roomId"], "r1");
        assert_eq!(error["data"]["shouldReload"], true);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        // テスト項目: 一時的でないエラーはリトライされず、再取得の失敗も握りつぶされる
        // given (前提条件):
        let harness = Harness::new();
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert_whiteboard()
            .times(1)
            .returning(|_, _, _| Err(StoreError::NotFound("r1".to_string())));
        store
            .expect_find_whiteboard()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));
        let usecase = usecase_with(&harness, store);
        let mut alice = harness.connect("a", "r1").await;

        // when (操作):
        let result = usecase.execute(command("a", "r1", state_with("shape:1"))).await;

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(alice.event_names(), vec!["tldraw-error"]);
    }
}
