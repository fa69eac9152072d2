//! DocumentStore 呼び出しの時間制限とリトライ
//!
//! ホワイトボードの書き込みは一時的なエラー（タイムアウト・競合・接続断）に限り、
//! 固定間隔で決められた回数までリトライします。CRDT のようなマージは行わず、後勝ちです。

use std::{future::Future, time::Duration};

use crate::domain::StoreError;

/// 既定の試行回数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// 既定のリトライ間隔
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// リトライ方針（試行回数と固定バックオフ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` は最低 1 回に切り上げる
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

/// 呼び出しを `limit` で打ち切る。時間切れは `StoreError::Timeout` として扱う
pub async fn bounded<T, Fut>(limit: Duration, call: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

/// 一時的なエラーの間だけ `call` をリトライする
///
/// 一時的でないエラー、または試行回数を使い切った時点のエラーをそのまま返す。
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation,
                    attempt,
                    policy.max_attempts,
                    e,
                    policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    "{} failed (attempt {}/{}): {}",
                    operation,
                    attempt,
                    policy.max_attempts,
                    e
                );
                return Err(e);
            }
        }
    }
}
