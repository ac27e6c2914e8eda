//! Long-lived chat subscriber over the push-based messaging transport.
//!
//! Dials the Pusher-compatible endpoint, subscribes to the channel's
//! chatroom, and persists every chat-message event, attributing it to the
//! currently-live broadcast via the live registry. Read failures close the
//! socket and re-dial after 1 s; dial failures retry after 5 s.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;
use uuid::Uuid;

use super::MonitorContext;
use crate::domain::payload::{parse_chat_time, ChatEventPayload, ChatFrame};
use crate::error::MonitorError;
use crate::persistence::models::{ChatEvent, MonitoredChannel};

/// Transport event tag carrying a chat message.
pub const CHAT_MESSAGE_EVENT: &str = "App\\Events\\ChatMessageEvent";

const SUBSCRIPTION_ACK_EVENT: &str = "pusher_internal:subscription_succeeded";

const REDIAL_DELAY: Duration = Duration::from_secs(1);
const DIAL_RETRY_DELAY: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Runs the chat subscription loop for one channel until shutdown.
pub async fn run(
    ctx: MonitorContext,
    channel: MonitoredChannel,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }

        let mut ws = match dial(&ctx.config.chat_ws_url, channel.chatroom_id).await {
            Ok(ws) => ws,
            Err(err) => {
                tracing::warn!(
                    channel = %channel.username,
                    %err,
                    "chat dial failed; retrying in 5 s"
                );
                if sleep_or_shutdown(DIAL_RETRY_DELAY, &mut shutdown).await {
                    return;
                }
                continue;
            }
        };
        tracing::info!(
            channel = %channel.username,
            chatroom_id = channel.chatroom_id,
            "chat transport connected and subscribed"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!(channel = %channel.username, "chat subscriber stopping");
                        let _ = ws.close(None).await;
                        return;
                    }
                }
                frame = ws.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(err) = handle_frame(&ctx, &channel, &text).await {
                                tracing::warn!(
                                    channel = %channel.username,
                                    %err,
                                    "chat frame dropped"
                                );
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if ws.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::warn!(
                                channel = %channel.username,
                                "chat transport closed by server; reconnecting"
                            );
                            break;
                        }
                        Some(Err(err)) => {
                            tracing::warn!(
                                channel = %channel.username,
                                %err,
                                "chat transport read failed; reconnecting"
                            );
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }

        let _ = ws.close(None).await;
        if sleep_or_shutdown(REDIAL_DELAY, &mut shutdown).await {
            return;
        }
    }
}

/// Dials the transport with the platform handshake parameters and sends the
/// chatroom subscription frame.
async fn dial(base_url: &str, chatroom_id: i64) -> Result<WsStream, MonitorError> {
    let url = Url::parse_with_params(
        base_url,
        &[
            ("protocol", "7"),
            ("client", "js"),
            ("version", "7.4.0"),
            ("flash", "false"),
        ],
    )
    .map_err(|err| MonitorError::Transport(format!("invalid chat transport url: {err}")))?;

    let (mut ws, _) = connect_async(url.as_str()).await?;

    let subscribe = serde_json::json!({
        "event": "pusher:subscribe",
        "data": {
            "auth": "",
            "channel": format!("chatrooms.{chatroom_id}.v2"),
        },
    });
    ws.send(Message::Text(subscribe.to_string())).await?;

    Ok(ws)
}

/// Dispatches one inbound transport frame.
async fn handle_frame(
    ctx: &MonitorContext,
    channel: &MonitoredChannel,
    raw: &str,
) -> Result<(), MonitorError> {
    let frame: ChatFrame = serde_json::from_str(raw)?;

    match frame.event.as_str() {
        SUBSCRIPTION_ACK_EVENT => {
            tracing::info!(
                channel = %channel.username,
                chatroom_id = channel.chatroom_id,
                "chat subscription acknowledged"
            );
        }
        CHAT_MESSAGE_EVENT => {
            let now = Utc::now();
            let livestream_id = ctx
                .registry
                .attributable_at(channel.channel_id, now, ctx.freshness_max_age())
                .await;

            let event = build_chat_event(&frame, livestream_id, now)?;
            if let Err(err) = ctx.store.insert_chat_event(&event).await {
                tracing::warn!(
                    channel = %channel.username,
                    message_id = %event.id,
                    %err,
                    "failed to persist chat event"
                );
            }
        }
        other => {
            tracing::debug!(
                channel = %channel.username,
                event = other,
                "unhandled chat transport event"
            );
        }
    }

    Ok(())
}

/// Decodes a chat-message frame's inner payload into a [`ChatEvent`] row.
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] when the inner JSON, the send
/// timestamp, or the message UUID fails to parse; the event is skipped.
pub(crate) fn build_chat_event(
    frame: &ChatFrame,
    livestream_id: Option<i64>,
    stored_at: DateTime<Utc>,
) -> Result<ChatEvent, MonitorError> {
    let payload: ChatEventPayload = serde_json::from_str(&frame.data)?;
    let sent_at = parse_chat_time(&payload.created_at)?;
    let id = Uuid::parse_str(&payload.id)?;

    Ok(ChatEvent {
        id,
        chatroom_id: payload.chatroom_id,
        livestream_id,
        sender_id: payload.sender.id,
        sender_handle: payload.sender.slug,
        event_tag: frame.event.clone(),
        body: payload.content,
        metadata: payload.metadata,
        sent_at,
        stored_at,
    })
}

/// Sleeps for `delay`, returning early with `true` when shutdown fires.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame(data: serde_json::Value) -> ChatFrame {
        ChatFrame {
            event: CHAT_MESSAGE_EVENT.to_string(),
            channel: "chatrooms.75033.v2".to_string(),
            data: data.to_string(),
        }
    }

    fn message_data() -> serde_json::Value {
        serde_json::json!({
            "id": "b2bb12d8-f960-49b5-b4b6-e3fa5e5c0a52",
            "chatroom_id": 75033,
            "content": "hi chat [emote:37226:KEKW]",
            "type": "message",
            "created_at": "2024-05-01T12:03:15+00:00",
            "sender": {
                "id": 101,
                "username": "Alice",
                "slug": "alice",
                "identity": {"color": "#75FD46", "badges": []}
            },
            "metadata": {"message_ref": "1714564995000"}
        })
    }

    #[test]
    fn chat_event_decodes_with_attribution() {
        let stored_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 16).unwrap();
        let event = build_chat_event(&frame(message_data()), Some(9), stored_at).expect("build");

        assert_eq!(
            event.id,
            Uuid::parse_str("b2bb12d8-f960-49b5-b4b6-e3fa5e5c0a52").unwrap()
        );
        assert_eq!(event.chatroom_id, 75033);
        assert_eq!(event.livestream_id, Some(9));
        assert_eq!(event.sender_id, 101);
        assert_eq!(event.sender_handle, "alice");
        assert_eq!(event.event_tag, CHAT_MESSAGE_EVENT);
        assert_eq!(
            event.sent_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 15).unwrap()
        );
        assert_eq!(event.stored_at, stored_at);
    }

    #[test]
    fn unattributed_event_stores_null_livestream() {
        let stored_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 16).unwrap();
        let event = build_chat_event(&frame(message_data()), None, stored_at).expect("build");
        assert_eq!(event.livestream_id, None);
    }

    #[test]
    fn malformed_message_id_is_rejected() {
        let mut data = message_data();
        data["id"] = serde_json::json!("not-a-uuid");
        let stored_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 16).unwrap();
        assert!(matches!(
            build_chat_event(&frame(data), None, stored_at),
            Err(MonitorError::PayloadInvalid(_))
        ));
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let mut data = message_data();
        data["created_at"] = serde_json::json!("2024-05-01 12:03:15");
        let stored_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 16).unwrap();
        assert!(matches!(
            build_chat_event(&frame(data), None, stored_at),
            Err(MonitorError::PayloadInvalid(_))
        ));
    }
}
