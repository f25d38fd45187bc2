//! Live dashboard WebSocket.
//!
//! On connect the dashboard receives one resync message (the session
//! snapshot, or the idle status), then every session event for its course
//! as JSON text frames. The caller is authorized before the bus is touched,
//! and the subscription is taken before the snapshot is read so nothing
//! falls between them; a duplicate rotation is harmless.

use super::caller::AuthenticatedCaller;
use super::error::ApiError;
use super::AppState;
use attendance_session::adapters::SessionBus;
use attendance_session::{
    AttendanceApi, SessionError, SessionEvent, SessionSnapshot, SessionStatus,
};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use shared_bus::EventStream;
use shared_types::{Caller, CourseId};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// First frame sent to a dashboard.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ResyncMessage {
    Snapshot(SessionSnapshot),
    Status(SessionStatus),
}

pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(course_id): Path<CourseId>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let (events, resync) = open_dashboard(&state, &caller, &course_id).await?;
    let bus = state.bus;
    Ok(ws.on_upgrade(move |socket| stream_events(socket, bus, course_id, events, resync)))
}

/// Authorize, subscribe, then read the resync state.
///
/// Rejected callers never reach the bus, so they leave no channel behind.
pub async fn open_dashboard(
    state: &AppState,
    caller: &Caller,
    course_id: &CourseId,
) -> Result<(EventStream<SessionEvent>, ResyncMessage), ApiError> {
    match state.service.session_snapshot(caller, course_id).await {
        Ok(_) | Err(SessionError::NoActiveSession) => {}
        Err(e) => return Err(e.into()),
    }

    let events = state.bus.event_stream(course_id);

    let resync = match state.service.session_snapshot(caller, course_id).await {
        Ok(snapshot) => ResyncMessage::Snapshot(snapshot),
        Err(SessionError::NoActiveSession) => {
            ResyncMessage::Status(state.service.session_status(course_id))
        }
        Err(e) => {
            drop(events);
            state.bus.prune_idle();
            return Err(e.into());
        }
    };

    Ok((events, resync))
}

fn to_frame<T: Serialize>(value: &T) -> Option<Message> {
    match serde_json::to_string(value) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            warn!(error = %e, "Failed to encode dashboard frame");
            None
        }
    }
}

async fn stream_events(
    mut socket: WebSocket,
    bus: Arc<SessionBus>,
    course_id: CourseId,
    mut events: EventStream<SessionEvent>,
    resync: ResyncMessage,
) {
    info!(
        course_id = %course_id,
        dashboards = bus.subscriber_count(&course_id),
        "Dashboard connected"
    );

    if let Some(frame) = to_frame(&resync) {
        if socket.send(frame).await.is_ok() {
            forward(&mut socket, &course_id, &mut events).await;
        }
    }

    drop(events);
    bus.prune_idle();
    info!(course_id = %course_id, "Dashboard disconnected");
}

async fn forward(
    socket: &mut WebSocket,
    course_id: &CourseId,
    events: &mut EventStream<SessionEvent>,
) {
    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    // Bus dropped: the process is shutting down.
                    break;
                };
                let Some(frame) = to_frame(&event) else {
                    continue;
                };
                if socket.send(frame).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(course_id = %course_id, error = %e, "Dashboard socket error");
                        break;
                    }
                }
            }
        }
    }
}
