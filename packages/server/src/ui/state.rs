//! Shared application state.

use std::sync::Arc;

use codeunity_shared::time::Clock;

use crate::{
    config::SyncConfig,
    domain::{DocumentStore, MessagePusher, RoomRegistry},
    usecase::{
        BroadcastFileContentUseCase, ChatRelay, ConnectParticipantUseCase, CreateFileUseCase,
        DeleteFileUseCase, DisconnectParticipantUseCase, GetChatHistoryUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, SaveFileUseCase,
        SendMessageUseCase, UpdateWhiteboardUseCase,
    },
};

/// Use cases shared by every connection and HTTP request
pub struct AppState {
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub update_whiteboard_usecase: Arc<UpdateWhiteboardUseCase>,
    pub create_file_usecase: Arc<CreateFileUseCase>,
    pub delete_file_usecase: Arc<DeleteFileUseCase>,
    pub save_file_usecase: Arc<SaveFileUseCase>,
    pub broadcast_file_content_usecase: Arc<BroadcastFileContentUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

impl AppState {
    /// Wire every use case to the given collaborators.
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        store: Arc<dyn DocumentStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let timeout = config.store_timeout;
        let chat_relay = Arc::new(ChatRelay::new(registry.clone(), message_pusher.clone()));
        let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
            registry.clone(),
            store.clone(),
            message_pusher.clone(),
            clock.clone(),
            chat_relay.clone(),
            timeout,
        ));

        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                registry.clone(),
                store.clone(),
                message_pusher.clone(),
                clock.clone(),
                chat_relay.clone(),
                disconnect_participant_usecase.clone(),
                timeout,
            )),
            disconnect_participant_usecase,
            update_whiteboard_usecase: Arc::new(UpdateWhiteboardUseCase::new(
                store.clone(),
                message_pusher.clone(),
                clock.clone(),
                config.whiteboard_retry,
                timeout,
            )),
            create_file_usecase: Arc::new(CreateFileUseCase::new(
                registry.clone(),
                store.clone(),
                message_pusher.clone(),
                clock.clone(),
                timeout,
            )),
            delete_file_usecase: Arc::new(DeleteFileUseCase::new(
                registry.clone(),
                store.clone(),
                message_pusher.clone(),
                timeout,
            )),
            save_file_usecase: Arc::new(SaveFileUseCase::new(
                registry.clone(),
                store.clone(),
                message_pusher.clone(),
                clock.clone(),
                timeout,
            )),
            broadcast_file_content_usecase: Arc::new(BroadcastFileContentUseCase::new(
                message_pusher.clone(),
                clock,
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                chat_relay,
                message_pusher.clone(),
            )),
            get_chat_history_usecase: Arc::new(GetChatHistoryUseCase::new(
                registry.clone(),
                message_pusher,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(registry.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                registry, store, timeout,
            )),
        }
    }
}
