use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::realtime::{RealtimeEvent, CHAT_CHANNEL};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReceipt {
    delivered: usize,
}

/// Fans a chat message out to live subscribers; nothing is persisted.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<ChatMessage>, JsonRejection>,
) -> ApiResult<Json<ChatReceipt>> {
    let Json(request) = payload?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    let delivered = state
        .broadcaster()
        .publish(RealtimeEvent::chat_message(&user_id, message));
    info!(
        "event=chat_publish module=api status=ok delivered={}",
        delivered
    );
    Ok(Json(ChatReceipt { delivered }))
}

/// Server-sent `new-message` events from `chat-channel`. A lagging client
/// skips what it missed.
pub async fn stream_messages(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!(
        "event=chat_subscribe module=api status=ok user_id={}",
        user_id
    );
    let events = BroadcastStream::new(state.broadcaster().subscribe()).filter_map(|received| {
        match received {
            Ok(event) if event.channel == CHAT_CHANNEL => {
                Some(Event::default().event(&event.event).json_data(&event.payload))
            }
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(
                    "event=chat_stream module=api status=lagged skipped={}",
                    skipped
                );
                None
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
