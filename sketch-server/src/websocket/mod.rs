use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::coordinator::{SessionCommand, SessionHandle};
use sketch_types::{ClientEvent, PlayerId};

pub mod connection;

pub use connection::ConnectionManager;

/// Owns one socket for its whole life: registers the connection, feeds
/// inbound events to the session, pumps session events back out, and on
/// either side closing tears the connection down and tells the session.
pub async fn handle_connection(
    websocket: WebSocket,
    connections: Arc<ConnectionManager>,
    session: SessionHandle,
) {
    let player_id: PlayerId = Uuid::new_v4();
    info!(%player_id, "new websocket connection");

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut events = connections.register(player_id).await;

    // Catch the new client up before it sends anything
    session.send(SessionCommand::Connected { id: player_id });

    let incoming_handler = {
        let session = session.clone();
        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        // Malformed input is a client bug, never a reason
                        // to take the session down
                        if let Err(e) = handle_message(msg, player_id, &session) {
                            warn!(%player_id, error = %e, "ignoring bad message");
                        }
                    }
                    Err(e) => {
                        warn!(%player_id, error = %e, "websocket error");
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        while let Some(event) = events.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(%player_id, error = %e, "failed to serialize event");
                    continue;
                }
            };

            if ws_sender.send(Message::text(json)).await.is_err() {
                break;
            }
        }
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!(%player_id, "connection closed");
    connections.remove(player_id).await;
    session.send(SessionCommand::Disconnected { id: player_id });
}

fn handle_message(msg: Message, player_id: PlayerId, session: &SessionHandle) -> Result<(), String> {
    // Pings and close frames are handled by warp
    if !msg.is_text() {
        return Ok(());
    }

    let text = msg.to_str().map_err(|_| "non-text payload".to_string())?;
    let event: ClientEvent =
        serde_json::from_str(text).map_err(|e| format!("invalid event: {e}"))?;

    session.send(command_for(player_id, event));
    Ok(())
}

fn command_for(id: PlayerId, event: ClientEvent) -> SessionCommand {
    match event {
        ClientEvent::Join { name } => SessionCommand::Join { id, name },
        ClientEvent::StartRound => SessionCommand::StartRound { id },
        ClientEvent::Guess { text } => SessionCommand::Guess { id, text },
        ClientEvent::DrawingFrame { data } => SessionCommand::DrawingFrame { id, data },
        ClientEvent::ClearCanvas => SessionCommand::ClearCanvas { id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_map_onto_session_commands() {
        let id = Uuid::new_v4();

        assert_eq!(
            command_for(
                id,
                ClientEvent::Join {
                    name: "Alice".into()
                }
            ),
            SessionCommand::Join {
                id,
                name: "Alice".into()
            }
        );
        assert_eq!(
            command_for(id, ClientEvent::StartRound),
            SessionCommand::StartRound { id }
        );
        assert_eq!(
            command_for(
                id,
                ClientEvent::Guess {
                    text: "apple".into()
                }
            ),
            SessionCommand::Guess {
                id,
                text: "apple".into()
            }
        );
        assert_eq!(
            command_for(id, ClientEvent::ClearCanvas),
            SessionCommand::ClearCanvas { id }
        );
    }
}
