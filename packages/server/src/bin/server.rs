//! CodeUnity room sync server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin codeunity-server
//! cargo run --bin codeunity-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use codeunity_server::{
    config::SyncConfig,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryDocumentStore, InMemoryRoomRegistry},
    },
    ui::{Server, state::AppState},
};
use codeunity_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "codeunity-server")]
#[command(about = "Real-time room sync server for CodeUnity", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "CODEUNITY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Attempts per whiteboard write before reporting failure
    #[arg(long, env = "CODEUNITY_WHITEBOARD_MAX_ATTEMPTS", default_value = "3")]
    whiteboard_max_attempts: u32,

    /// Fixed delay between whiteboard write attempts (ms)
    #[arg(long, env = "CODEUNITY_WHITEBOARD_RETRY_BACKOFF_MS", default_value = "100")]
    whiteboard_retry_backoff_ms: u64,

    /// Upper bound for a single document store call (ms)
    #[arg(long, env = "CODEUNITY_STORE_TIMEOUT_MS", default_value = "5000")]
    store_timeout_ms: u64,

    /// Messages kept per room, 0 keeps all
    #[arg(long, env = "CODEUNITY_CHAT_HISTORY_LIMIT", default_value = "0")]
    chat_history_limit: usize,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logger(&["codeunity_server", "tower_http"], &args.log_level);

    let config = SyncConfig::from_parts(
        args.whiteboard_max_attempts,
        args.whiteboard_retry_backoff_ms,
        args.store_timeout_ms,
        args.chat_history_limit,
    );
    tracing::debug!("Sync config: {:?}", config);

    // 1. Room Registry / DocumentStore / MessagePusher
    let registry = Arc::new(InMemoryRoomRegistry::with_history_limit(
        config.chat_history_limit,
    ));
    let store = Arc::new(InMemoryDocumentStore::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 2. UseCases
    let state = AppState::new(
        registry,
        store,
        message_pusher,
        Arc::new(SystemClock),
        config,
    );

    // 3. Server
    let server = Server::new(Arc::new(state));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
