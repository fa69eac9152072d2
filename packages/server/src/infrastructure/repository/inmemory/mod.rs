//! インメモリ実装

mod document_store;
mod room_registry;

pub use document_store::InMemoryDocumentStore;
pub use room_registry::InMemoryRoomRegistry;
