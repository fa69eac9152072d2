//! UseCase 層
//!
//! ソケットイベント 1 種類につき 1 つのユースケースを定義します。
//! 各ユースケースは Repository / DocumentStore / MessagePusher の trait にのみ依存します。

mod broadcast_file_content;
mod chat_relay;
mod connect_participant;
mod create_file;
mod delete_file;
mod disconnect_participant;
mod error;
mod file_index;
mod get_chat_history;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod retry;
mod save_file;
mod send_message;
mod update_whiteboard;

#[cfg(test)]
mod test_support;

pub use broadcast_file_content::BroadcastFileContentUseCase;
pub use chat_relay::ChatRelay;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_file::CreateFileUseCase;
pub use delete_file::DeleteFileUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    ChatHistoryError, FileSyncError, GetRoomDetailError, SendMessageError, UpdateWhiteboardError,
};
pub use get_chat_history::GetChatHistoryUseCase;
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomCommand, JoinRoomUseCase};
pub use retry::{RetryPolicy, bounded, retry_transient};
pub use save_file::SaveFileUseCase;
pub use send_message::SendMessageUseCase;
pub use update_whiteboard::{UpdateWhiteboardCommand, UpdateWhiteboardUseCase};
