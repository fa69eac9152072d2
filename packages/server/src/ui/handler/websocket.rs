//! WebSocket connection handlers.
//!
//! One reader loop per connection awaits each handler before reading the next
//! frame, so events from a connection are processed in receipt order. Outbound
//! events flow through the connection's own channel and writer task.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{
        ChatMessage, ConnectionId, ConnectionRole, FileName, Membership, RoomId, Username,
    },
    infrastructure::dto::websocket::{
        ChatHistoryRequest, ChatMessageDto, ClientEvent, FileDeletePayload, FilePayload,
        JoinRoomPayload, WhiteboardUpdatePayload,
    },
    ui::state::AppState,
    usecase::{JoinRoomCommand, UpdateWhiteboardCommand},
};

/// Room membership of one connection, set by `join-room`
type MembershipSlot = Arc<Mutex<Option<Membership>>>;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that forwards queued events from `rx` to the WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_participant_usecase.execute(tx).await;
    tracing::info!("Connection '{}' established", connection_id);

    let membership: MembershipSlot = Arc::new(Mutex::new(None));

    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();
    let membership_clone = membership.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", connection_id_clone, text);
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => {
                            dispatch(&state_clone, &connection_id_clone, &membership_clone, event)
                                .await
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Dropped unparseable frame from '{}': {}",
                                connection_id_clone,
                                e
                            );
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let membership = membership.lock().await.take();
    state
        .disconnect_participant_usecase
        .execute(&connection_id, membership)
        .await;
    tracing::info!("Connection '{}' closed", connection_id);
}

async fn dispatch(
    state: &AppState,
    connection_id: &ConnectionId,
    membership: &MembershipSlot,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom(payload) => join_room(state, connection_id, membership, payload).await,
        ClientEvent::Update(payload) => {
            update_whiteboard(state, connection_id, membership, payload).await
        }
        ClientEvent::FileCreated(payload) => {
            let Some((room_id, file_name)) = file_target(&payload.room_id, &payload.file_name)
            else {
                return;
            };
            // 失敗は送信者に file-error として通知済み
            let _ = state
                .create_file_usecase
                .execute(
                    connection_id,
                    room_id,
                    file_name,
                    payload.content.unwrap_or_default(),
                )
                .await;
        }
        ClientEvent::FileDeleted(FileDeletePayload { room_id, file_name }) => {
            let Some((room_id, file_name)) = file_target(&room_id, &file_name) else {
                return;
            };
            let _ = state
                .delete_file_usecase
                .execute(connection_id, room_id, file_name)
                .await;
        }
        ClientEvent::FileUpdated(payload) => {
            let Some((room_id, file_name)) = file_target(&payload.room_id, &payload.file_name)
            else {
                return;
            };
            let _ = state
                .save_file_usecase
                .execute(
                    connection_id,
                    room_id,
                    file_name,
                    payload.content.unwrap_or_default(),
                )
                .await;
        }
        ClientEvent::FileContentChange(FilePayload {
            room_id,
            file_name,
            content,
        }) => {
            let Some((room_id, file_name)) = file_target(&room_id, &file_name) else {
                return;
            };
            state
                .broadcast_file_content_usecase
                .execute(
                    connection_id,
                    &room_id,
                    file_name,
                    content.unwrap_or_default(),
                )
                .await;
        }
        ClientEvent::SendMessage(dto) => send_message(state, connection_id, dto).await,
        ClientEvent::GetChatHistory(ChatHistoryRequest { room_id }) => {
            let Ok(room_id) = RoomId::new(room_id.unwrap_or_default()) else {
                tracing::warn!("Dropped get-chat-history without roomId from '{}'", connection_id);
                return;
            };
            if let Err(e) = state
                .get_chat_history_usecase
                .execute(connection_id, &room_id)
                .await
            {
                tracing::warn!("Failed to send chat history to '{}': {}", connection_id, e);
            }
        }
    }
}

async fn join_room(
    state: &AppState,
    connection_id: &ConnectionId,
    membership: &MembershipSlot,
    payload: JoinRoomPayload,
) {
    let (room_id, username, is_whiteboard_connection) = match payload {
        JoinRoomPayload::Legacy(room_id) => (room_id, None, false),
        JoinRoomPayload::Detailed(request) => (
            request.room_id,
            request.username,
            request.is_tldraw_connection.unwrap_or(false),
        ),
    };

    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::warn!("Dropped join-room from '{}': {}", connection_id, e);
            return;
        }
    };
    let username = username
        .and_then(|name| Username::new(name).ok())
        .unwrap_or_else(|| Username::fallback_for(connection_id));

    let command = JoinRoomCommand {
        connection_id: connection_id.clone(),
        room_id,
        username,
        role: ConnectionRole::from_whiteboard_flag(is_whiteboard_connection),
    };

    let mut current = membership.lock().await;
    let joined = state
        .join_room_usecase
        .execute(command, current.as_ref())
        .await;
    *current = Some(joined);
}

async fn update_whiteboard(
    state: &AppState,
    connection_id: &ConnectionId,
    membership: &MembershipSlot,
    payload: WhiteboardUpdatePayload,
) {
    let WhiteboardUpdatePayload {
        room_id,
        state: whiteboard,
        changes,
        timestamp,
    } = payload;

    // roomId が省略されたら参加中のルームを使う
    let room_id = match room_id.map(RoomId::new) {
        Some(Ok(room_id)) => Some(room_id),
        Some(Err(_)) | None => membership
            .lock()
            .await
            .as_ref()
            .map(|joined| joined.room_id.clone()),
    };
    let Some(room_id) = room_id else {
        tracing::warn!("Dropped update without roomId from '{}'", connection_id);
        return;
    };
    let Some(whiteboard) = whiteboard else {
        tracing::warn!("Dropped update without state from '{}'", connection_id);
        return;
    };

    let command = UpdateWhiteboardCommand {
        connection_id: connection_id.clone(),
        room_id,
        state: whiteboard,
        changes,
        timestamp,
    };
    if let Err(e) = state.update_whiteboard_usecase.execute(command).await {
        tracing::debug!("Whiteboard update from '{}' not applied: {}", connection_id, e);
    }
}

async fn send_message(state: &AppState, connection_id: &ConnectionId, dto: ChatMessageDto) {
    // DTO から Domain Model への変換
    let message = match ChatMessage::try_from(dto) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Dropped send-message from '{}': {}", connection_id, e);
            return;
        }
    };

    if let Err(e) = state
        .send_message_usecase
        .execute(connection_id, message)
        .await
    {
        tracing::warn!("Failed to notify room of message from '{}': {}", connection_id, e);
    }
}

fn file_target(room_id: &str, file_name: &str) -> Option<(RoomId, FileName)> {
    match (
        RoomId::new(room_id.to_string()),
        FileName::new(file_name.to_string()),
    ) {
        (Ok(room_id), Ok(file_name)) => Some((room_id, file_name)),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Dropped file event: {}", e);
            None
        }
    }
}
