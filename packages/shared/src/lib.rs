//! Shared utilities for the CodeUnity sync server.

pub mod logger;
pub mod time;
