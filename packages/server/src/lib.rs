//! CodeUnity real-time room sync server.
//!
//! Keeps per-room membership, chat and file state in memory, persists
//! whiteboard snapshots and files through a document store, and relays
//! every mutation to the other connections of the room over WebSocket.

// layers
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
