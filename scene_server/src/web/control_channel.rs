use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{stream::SplitStream, SinkExt, StreamExt};

use super::sync::SyncState;

/// Any path upgrades to the control channel.
pub fn control_router(state: Arc<SyncState>) -> Router {
    Router::new()
        .route("/", get(control_handler))
        .fallback(control_handler)
        .with_state(state)
}

async fn control_handler(ws: WebSocketUpgrade, State(state): State<Arc<SyncState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_control(socket, state))
}

/// Runs one client from upgrade to close. Nothing the client does can affect
/// other clients or the driver.
pub async fn handle_control(socket: WebSocket, state: Arc<SyncState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut session = tokio::select! {
        session = state.connect() => match session {
            Ok(session) => session,
            Err(e) => {
                log::error!("Handshake failed: {e}");
                return;
            }
        },
        _ = wait_for_close(&mut receiver) => {
            log::info!("Client left before the scene was ready");
            return;
        }
    };
    let id = session.id();

    loop {
        tokio::select! {
            frame = session.recv() => match frame {
                Some(frame) => {
                    if sender.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
                // Dropped by the server.
                None => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    session.close();
    log::info!("Client {id} disconnected");
}

async fn wait_for_close(receiver: &mut SplitStream<WebSocket>) {
    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Close(_) = message {
            return;
        }
    }
}
