//! Runtime configuration for the sync engine

use std::time::Duration;

use crate::usecase::RetryPolicy;

/// Default bound for a single Document Store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables shared by the use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Retry policy for whiteboard writes
    pub whiteboard_retry: RetryPolicy,
    /// Upper bound for each Document Store call
    pub store_timeout: Duration,
    /// Per-room chat history cap (`None` keeps every message)
    pub chat_history_limit: Option<usize>,
}

impl SyncConfig {
    /// Build from raw CLI values. A history limit of 0 means unbounded.
    pub fn from_parts(
        whiteboard_max_attempts: u32,
        whiteboard_retry_backoff_ms: u64,
        store_timeout_ms: u64,
        chat_history_limit: usize,
    ) -> Self {
        Self {
            whiteboard_retry: RetryPolicy::new(
                whiteboard_max_attempts,
                Duration::from_millis(whiteboard_retry_backoff_ms),
            ),
            store_timeout: Duration::from_millis(store_timeout_ms),
            chat_history_limit: (chat_history_limit > 0).then_some(chat_history_limit),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            whiteboard_retry: RetryPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            chat_history_limit: None,
        }
    }
}
