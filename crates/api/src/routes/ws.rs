//! `/ws/seats/{showtime_id}`: a split-socket handler merging three
//! event sources per connection — incoming client
//! frames, this showtime's bus broadcast, and this session's personal
//! reply channel — following the bus's own forwarder/timeout pattern
//! in `cinerail_bus::local`.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{Json, Response};
use axum::routing::get;
use axum::Router;
use cinerail_types::api::{ClientMessage, WsEvent};
use cinerail_types::enums::EventType;
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::middleware::AppState;

/// How long the socket will wait for an incoming client frame before
/// treating the connection as dead.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a single outbound frame write may take before the
/// connection is dropped, mirroring the bus's own per-subscriber
/// forwarding bound.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    showtime_id: Uuid,
    subscribers: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/seats/:showtime_id", get(upgrade))
        .route("/ws/status/:showtime_id", get(status))
}

async fn status(State(state): State<AppState>, Path(showtime_id): Path<Uuid>) -> Json<StatusResponse> {
    let subscribers = state.registry.count(showtime_id).await;
    Json(StatusResponse { showtime_id, subscribers })
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(showtime_id): Path<Uuid>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, showtime_id, query.session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, showtime_id: Uuid, session_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (personal_tx, mut personal_rx) = mpsc::channel::<WsEvent>(32);
    let mut bus_sub = state.bus.subscribe(showtime_id);

    state.registry.register(showtime_id, session_id.clone(), personal_tx.clone()).await;

    match state.reservations.seat_map(showtime_id).await {
        Ok(seats) => {
            let event = WsEvent::new(EventType::InitialData, showtime_id, serde_json::json!({ "seats": seats }));
            if write_event(&mut sender, event).await.is_err() {
                state.registry.unregister(showtime_id, &session_id).await;
                return;
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, %showtime_id, "ws: failed to build initial snapshot");
            let event = WsEvent::new(
                EventType::Error,
                showtime_id,
                serde_json::json!({ "message": "showtime not found" }),
            );
            let _ = write_event(&mut sender, event).await;
            state.registry.unregister(showtime_id, &session_id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = tokio::time::timeout(READ_TIMEOUT, receiver.next()) => {
                match incoming {
                    Ok(Some(Ok(message))) => {
                        if !handle_client_message(&state, showtime_id, &session_id, message, &mut sender).await {
                            break;
                        }
                    }
                    Ok(Some(Err(e))) => {
                        tracing::debug!(error = %e, %session_id, "ws: client stream error, closing");
                        break;
                    }
                    Ok(None) => break, // client closed
                    Err(_) => {
                        tracing::debug!(%session_id, "ws: no client frame within read timeout, closing");
                        break;
                    }
                }
            }
            event = bus_sub.recv() => {
                match event {
                    Some(event) => {
                        if write_event(&mut sender, event).await.is_err() {
                            break;
                        }
                    }
                    None => break, // bus dropped this subscriber (lag or stall)
                }
            }
            event = personal_rx.recv() => {
                match event {
                    Some(event) => {
                        if write_event(&mut sender, event).await.is_err() {
                            break;
                        }
                    }
                    None => break, // registry's sender half dropped
                }
            }
        }
    }

    state.registry.unregister(showtime_id, &session_id).await;
}

/// Returns `false` when the connection should close.
async fn handle_client_message<S>(
    state: &AppState,
    showtime_id: Uuid,
    session_id: &str,
    message: Message,
    sender: &mut S,
) -> bool
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = match message {
        Message::Text(text) => text,
        Message::Close(_) => return false,
        Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => return true,
    };

    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(ClientMessage::Ping) => {
            let event = WsEvent::new(EventType::Pong, showtime_id, serde_json::json!({}));
            write_event(sender, event).await.is_ok()
        }
        Ok(ClientMessage::Heartbeat) => {
            let event = WsEvent::new(EventType::HeartbeatAck, showtime_id, serde_json::json!({}));
            write_event(sender, event).await.is_ok()
        }
        Ok(ClientMessage::ReserveSeat { seat_id, session_id: requester }) => {
            match state.reservations.reserve(showtime_id, seat_id, &requester, None).await {
                Ok(_) => true,
                Err(e) => {
                    let event = WsEvent::new(
                        EventType::Error,
                        showtime_id,
                        serde_json::json!({ "message": e.to_string() }),
                    );
                    write_event(sender, event).await.is_ok()
                }
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, %session_id, "ws: unrecognized client message, ignoring");
            true
        }
    }
}

async fn write_event<S>(sender: &mut S, event: WsEvent) -> Result<(), ()>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let Ok(payload) = serde_json::to_string(&event) else { return Err(()) };
    match tokio::time::timeout(WRITE_TIMEOUT, sender.send(Message::Text(payload))).await {
        Ok(Ok(())) => Ok(()),
        _ => Err(()),
    }
}
