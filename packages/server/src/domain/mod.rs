//! ドメイン層
//!
//! ルーム同期エンジンのビジネスルールを表現する型と、
//! UseCase 層が依存するインターフェース（trait）を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, FileRecord, Membership, MessageKind, Participant, RoomSnapshot,
    WhiteboardSnapshot, WhiteboardState,
};
pub use error::{MessagePushError, StoreError, ValueObjectError};
pub use event::RoomEvent;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{Departure, DocumentStore, JoinOutcome, RoomRegistry};
pub use value_object::{ConnectionId, ConnectionRole, FileName, RoomId, Timestamp, Username};

#[cfg(test)]
pub use repository::MockDocumentStore;
