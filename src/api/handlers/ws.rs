use std::borrow::Cow;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::access::active_session;
use crate::api::state::AppState;
use crate::auth::jwt::authenticate;
use crate::realtime::{dispatch, Disposition};

/// Query string of the websocket endpoint
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub session_id: Option<String>,
    pub token: Option<String>,
}

/// Real-time channel for one session
///
/// GET /v1/aura/ws?session_id=&token=
///
/// Authentication runs before the upgrade; a rejected client still gets the
/// upgrade and is then closed with a policy-violation frame.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let admitted = admit(&state, &params).await;
    ws.on_upgrade(move |socket| async move {
        match admitted {
            Ok(session_id) => handle_socket(socket, state, session_id).await,
            Err(reason) => reject(socket, reason).await,
        }
    })
}

async fn admit(state: &AppState, params: &WsParams) -> Result<Uuid, String> {
    let user_id = authenticate(params.token.as_deref(), &state.jwt_secret).map_err(|e| e.to_string())?;

    let session_id = params
        .session_id
        .as_deref()
        .ok_or_else(|| "Missing session_id".to_string())?
        .parse::<Uuid>()
        .map_err(|_| "Invalid session_id".to_string())?;

    active_session(state, session_id, user_id)
        .await
        .map(|session| session.id())
        .map_err(|e| e.message)
}

async fn reject(mut socket: WebSocket, reason: String) {
    tracing::warn!(%reason, "Rejecting websocket connection");
    let _ = socket
        .send(WsMessage::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: Cow::Owned(reason),
        })))
        .await;
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: Uuid) {
    let (connection_id, mut outbox) = state.connections.connect(session_id).await;
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Task: forward queued events to the socket until the connection is deregistered
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%session_id, %connection_id, error = %e, "Dropping unserializable event");
                    continue;
                }
            };
            if ws_sender.send(WsMessage::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = ws_sender.send(WsMessage::Close(None)).await;
    });

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                let disposition = dispatch(&state.connections, session_id, connection_id, &text, || {
                    state.orchestrators.get(session_id).map(|o| o.lattice())
                })
                .await;
                if disposition == Disposition::Close {
                    break;
                }
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%session_id, %connection_id, error = %e, "Websocket receive failed");
                state
                    .connections
                    .send_error(session_id, format!("Connection error: {e}"), None)
                    .await;
                break;
            }
        }
    }

    state.connections.disconnect(session_id, connection_id).await;
    let _ = send_task.await;
    tracing::info!(%session_id, %connection_id, "WebSocket disconnected");
}
