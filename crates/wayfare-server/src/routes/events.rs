//! WebSocket stream of queued write outcomes for the back office

use crate::{AppState, auth::AdminCaller, worker::AdminEvent};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Upgrade to a websocket that relays every [`AdminEvent`]
pub async fn admin_events_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AdminCaller(admin): AdminCaller,
) -> Response {
    info!("Event stream requested by {}", admin.email);
    ws.on_upgrade(move |socket| handle_admin_events(socket, state, admin.email))
}

async fn handle_admin_events(socket: WebSocket, state: AppState, email: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.as_str() == "ping" {
                            if let Err(e) = sender.send(Message::Text("pong".into())).await {
                                error!("Failed to send pong: {}", e);
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Event stream closed for {}", email);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error for {}: {}", email, e);
                        break;
                    }
                    _ => {}
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(e) = send_event(&mut sender, &event).await {
                            error!("Failed to send admin event: {}", e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event stream for {} skipped {} events", email, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = sender.close().await;
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &AdminEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let json = serde_json::to_string(event)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
