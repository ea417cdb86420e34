use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::events::MatchEventHub;
use duel_persistence::StoreError;
use duel_persistence::repositories::MatchRepository;
use duel_types::{ClientMessage, MatchId, ServerMessage, SessionId};

/// Live match subscription. The first client frame picks the match and
/// session; after that the server owns the conversation, re-delivering a
/// personalized snapshot on every committed mutation of that match.
pub async fn handle_connection(
    websocket: WebSocket,
    match_repository: Arc<MatchRepository>,
    event_hub: Arc<MatchEventHub>,
) {
    let (mut ws_sender, mut ws_receiver) = websocket.split();

    let (match_id, session_id) = loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) if msg.is_text() => {
                match parse_subscribe(msg.to_str().unwrap_or("")) {
                    Ok(ids) => break ids,
                    Err(message) => {
                        send(&mut ws_sender, &ServerMessage::Error { message }).await;
                        return;
                    }
                }
            }
            Some(Ok(msg)) if msg.is_close() => return,
            Some(Ok(_)) => continue, // pings and binary frames
            Some(Err(e)) => {
                warn!("WebSocket error before subscription: {}", e);
                return;
            }
            None => return,
        }
    };

    // Subscribe before the first snapshot so no mutation slips between them
    let mut events = event_hub.subscribe(match_id);
    info!("Session {} subscribed to match {}", session_id, match_id);

    if !push_snapshot(&mut ws_sender, &match_repository, match_id, session_id).await {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    // A lagged receiver loses nothing: every tick re-queries
                    // current state anyway.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if !push_snapshot(&mut ws_sender, &match_repository, match_id, session_id)
                            .await
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => {} // nothing further to say mid-subscription
                    Some(Err(e)) => {
                        warn!("WebSocket error for session {}: {}", session_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(
        "Subscription of session {} to match {} closed",
        session_id, match_id
    );
}

fn parse_subscribe(text: &str) -> Result<(MatchId, SessionId), String> {
    let message: ClientMessage =
        serde_json::from_str(text).map_err(|_| "Invalid JSON message".to_string())?;
    let ClientMessage::SubscribeMatch {
        match_id,
        session_id,
    } = message;

    let match_id: MatchId = match_id.parse().map_err(|e| format!("{}", e))?;
    let session_id: SessionId = session_id.parse().map_err(|e| format!("{}", e))?;
    Ok((match_id, session_id))
}

async fn push_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    repository: &MatchRepository,
    match_id: MatchId,
    session_id: SessionId,
) -> bool {
    let snapshot = async {
        let match_state = repository.get_match(match_id).await?;
        let you = repository.get_player_state(match_id, session_id).await?;
        let opponent = repository.get_opponent_state(match_id, session_id).await?;
        Ok::<ServerMessage, StoreError>(ServerMessage::MatchSnapshot {
            match_state,
            you,
            opponent,
        })
    }
    .await;

    match snapshot {
        Ok(message) => send(sender, &message).await,
        Err(StoreError::Domain(err)) => {
            send(
                sender,
                &ServerMessage::Error {
                    message: err.to_string(),
                },
            )
            .await;
            false
        }
        Err(err) => {
            error!(
                "Failed to build snapshot for match {}: {}",
                match_id, err
            );
            send(
                sender,
                &ServerMessage::Error {
                    message: "Internal server error".to_string(),
                },
            )
            .await;
            false
        }
    }
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message: {:?}", e);
            return false;
        }
    };

    sender.send(Message::text(json)).await.is_ok()
}
