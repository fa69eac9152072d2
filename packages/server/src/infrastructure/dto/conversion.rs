//! Conversion logic between DTOs and domain entities.

use codeunity_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, FileRecord, MessageKind, Participant, RoomEvent, RoomId, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::MessageKindDto> for MessageKind {
    fn from(dto: dto::MessageKindDto) -> Self {
        match dto {
            dto::MessageKindDto::User => Self::User,
            dto::MessageKindDto::System => Self::System,
        }
    }
}

impl TryFrom<dto::ChatMessageDto> for ChatMessage {
    type Error = ValueObjectError;

    /// `roomId` が無い、または空のメッセージは変換できない
    fn try_from(dto: dto::ChatMessageDto) -> Result<Self, Self::Error> {
        let room_id = RoomId::new(dto.room_id.unwrap_or_default())?;
        Ok(Self {
            kind: dto.kind.map(MessageKind::from),
            username: dto.username,
            text: dto.text,
            timestamp: dto.timestamp,
            room_id,
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<MessageKind> for dto::MessageKindDto {
    fn from(model: MessageKind) -> Self {
        match model {
            MessageKind::User => Self::User,
            MessageKind::System => Self::System,
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            kind: model.kind.map(dto::MessageKindDto::from),
            username: model.username.clone(),
            text: model.text.clone(),
            timestamp: model.timestamp.clone(),
            room_id: Some(model.room_id.as_str().to_string()),
        }
    }
}

impl From<&Participant> for dto::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            connection_id: model.connection_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
        }
    }
}

impl From<&FileRecord> for dto::FileInfo {
    fn from(model: &FileRecord) -> Self {
        Self {
            file_name: model.file_name.as_str().to_string(),
            content: model.content.clone(),
            updated_at: timestamp_to_rfc3339(model.updated_at.value()),
        }
    }
}

impl From<&RoomEvent> for dto::ServerEvent {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::Connected { connection_id } => Self::Connected(dto::ConnectedPayload {
                connection_id: connection_id.as_str().to_string(),
            }),
            RoomEvent::InitState(snapshot) => Self::InitState(snapshot.to_value()),
            RoomEvent::UpdateUserList(participants) => {
                Self::UpdateUserList(participants.iter().map(Into::into).collect())
            }
            RoomEvent::UsersList(connection_ids) => Self::UsersList(
                connection_ids
                    .iter()
                    .map(|id| id.as_str().to_string())
                    .collect(),
            ),
            RoomEvent::UserJoined { username } => Self::UserJoined(dto::UsernamePayload {
                username: username.as_str().to_string(),
            }),
            RoomEvent::UserLeft { username } => Self::UserLeft(dto::UsernamePayload {
                username: username.as_str().to_string(),
            }),
            RoomEvent::ChatHistory(messages) => {
                Self::ChatHistory(messages.iter().map(Into::into).collect())
            }
            RoomEvent::ReceiveMessage(message) => Self::ReceiveMessage(message.into()),
            RoomEvent::ChatNotification {
                room_id,
                username,
                text,
                timestamp,
            } => Self::ChatNotification(dto::ChatNotificationPayload {
                room_id: room_id.as_str().to_string(),
                username: username.clone(),
                text: text.clone(),
                timestamp: timestamp.clone(),
            }),
            RoomEvent::FilesListUpdated(files) => Self::FilesListUpdated(dto::FilesListPayload {
                files: files.iter().map(Into::into).collect(),
            }),
            RoomEvent::FileCreated(file) => Self::FileCreated(file.into()),
            RoomEvent::FileDeleted { file_name } => Self::FileDeleted(dto::FileDeletedPayload {
                file_name: file_name.as_str().to_string(),
            }),
            RoomEvent::FileContentChanged {
                file_name,
                content,
                timestamp,
            } => Self::FileContentChange(dto::FileContentChangePayload {
                file_name: file_name.as_str().to_string(),
                content: content.clone(),
                timestamp: timestamp.value(),
            }),
            RoomEvent::FileUpdated(file) => Self::FileUpdated(file.into()),
            RoomEvent::FileError { error, details } => Self::FileError(dto::FileErrorPayload {
                error: error.clone(),
                details: details.clone(),
            }),
            RoomEvent::WhiteboardUpdated {
                changes,
                snapshot,
                timestamp,
                source_id,
                state_version,
            } => Self::Update(dto::WhiteboardBroadcastPayload {
                changes: changes.clone(),
                state: snapshot.to_value(),
                timestamp: timestamp.clone(),
                source_id: source_id.as_str().to_string(),
                state_version: *state_version,
            }),
            RoomEvent::WhiteboardError {
                message,
                room_id,
                error,
                should_reload,
            } => Self::TldrawError(dto::WhiteboardErrorPayload {
                message: message.clone(),
                room_id: room_id.as_str().to_string(),
                error: error.clone(),
                should_reload: *should_reload,
            }),
        }
    }
}
