//! Data Transfer Objects (DTOs) for the sync server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event envelopes (`{"event": ..., "data": ...}`)
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
