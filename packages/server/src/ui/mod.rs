//! WebSocket sync server and read-only HTTP API.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
