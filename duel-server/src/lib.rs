use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus, json, with_status};

use crate::config::Config;
use crate::events::MatchEventHub;
use duel_core::WordList;
use duel_persistence::StoreError;
use duel_persistence::repositories::{MatchRepository, QueueRepository};
use duel_types::{
    AckResponse, CurrentGuessRequest, DomainError, GuessRequest, GuessResponse, MatchId, SessionId,
    SessionRequest,
};

pub mod config;
pub mod events;
pub mod ws;

#[derive(Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Beacon parameters are optional at the type level so that a missing field
/// produces our own 400 envelope instead of a bare rejection.
#[derive(Deserialize)]
struct BeaconQuery {
    match_id: Option<String>,
    session_id: Option<String>,
}

pub fn create_routes(
    queue_repository: Arc<QueueRepository>,
    match_repository: Arc<MatchRepository>,
    word_list: Arc<WordList>,
    event_hub: Arc<MatchEventHub>,
    config: Config,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Clone for filters
    let queue_filter = warp::any().map({
        let queue_repository = queue_repository.clone();
        move || queue_repository.clone()
    });

    let match_filter = warp::any().map({
        let match_repository = match_repository.clone();
        move || match_repository.clone()
    });

    let words_filter = warp::any().map({
        let word_list = word_list.clone();
        move || word_list.clone()
    });

    let hub_filter = warp::any().map({
        let event_hub = event_hub.clone();
        move || event_hub.clone()
    });

    let config_filter = warp::any().map({
        let config = config.clone();
        move || config.clone()
    });

    let join_queue = warp::path!("queue" / "join")
        .and(warp::post())
        .and(queue_filter.clone())
        .and(words_filter.clone())
        .and(config_filter.clone())
        .and_then(handle_join_queue);

    let leave_queue = warp::path!("queue" / "leave")
        .and(warp::post())
        .and(warp::body::json())
        .and(queue_filter.clone())
        .and_then(handle_leave_queue);

    let queue_count = warp::path!("queue" / "count")
        .and(warp::get())
        .and(queue_filter.clone())
        .and_then(handle_queue_count);

    let queue_status = warp::path!("queue" / "status")
        .and(warp::get())
        .and(warp::query::<SessionQuery>())
        .and(queue_filter.clone())
        .and_then(handle_queue_status);

    let get_match = warp::path!("match" / String)
        .and(warp::get())
        .and(match_filter.clone())
        .and_then(handle_get_match);

    let get_player = warp::path!("match" / String / "player")
        .and(warp::get())
        .and(warp::query::<SessionQuery>())
        .and(match_filter.clone())
        .and_then(handle_get_player);

    let get_opponent = warp::path!("match" / String / "opponent")
        .and(warp::get())
        .and(warp::query::<SessionQuery>())
        .and(match_filter.clone())
        .and_then(handle_get_opponent);

    let submit_guess = warp::path!("match" / String / "guess")
        .and(warp::post())
        .and(warp::body::json())
        .and(match_filter.clone())
        .and(words_filter.clone())
        .and(hub_filter.clone())
        .and(config_filter.clone())
        .and_then(handle_submit_guess);

    let current_guess = warp::path!("match" / String / "current-guess")
        .and(warp::post())
        .and(warp::body::json())
        .and(match_filter.clone())
        .and(hub_filter.clone())
        .and_then(handle_current_guess);

    let leave_match = warp::path!("match" / String / "leave")
        .and(warp::post())
        .and(warp::body::json())
        .and(match_filter.clone())
        .and(hub_filter.clone())
        .and_then(handle_leave_match);

    // Fire-and-forget target for navigator.sendBeacon on page unload; also
    // reachable via GET so a crashing client has every chance of landing it.
    let leave_beacon = warp::path!("leave-beacon")
        .and(warp::get().or(warp::post()).unify())
        .and(warp::query::<BeaconQuery>())
        .and(match_filter.clone())
        .and(hub_filter.clone())
        .and_then(handle_leave_beacon);

    // Health check endpoint
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| with_status("OK", StatusCode::OK));

    // WebSocket subscription endpoint
    let websocket = warp::path!("ws")
        .and(warp::ws())
        .and(match_filter.clone())
        .and(hub_filter.clone())
        .map(
            |ws: warp::ws::Ws, match_repository: Arc<MatchRepository>, event_hub: Arc<MatchEventHub>| {
                ws.on_upgrade(move |socket| {
                    ws::handle_connection(socket, match_repository, event_hub)
                })
            },
        );

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(join_queue)
        .or(leave_queue)
        .or(queue_count)
        .or(queue_status)
        .or(submit_guess)
        .or(current_guess)
        .or(leave_match)
        .or(get_player)
        .or(get_opponent)
        .or(get_match)
        .or(leave_beacon)
        .with(cors)
        .with(warp::log("word_duel"))
}

async fn handle_join_queue(
    queue_repository: Arc<QueueRepository>,
    word_list: Arc<WordList>,
    config: Config,
) -> Result<WithStatus<Json>, warp::Rejection> {
    // The candidate word is only consumed if this join actually pairs
    let target_word = match word_list.random_word(config.word_length) {
        Ok(word) => word,
        Err(err) => {
            error!("No target word available: {}", err);
            return Ok(internal_error());
        }
    };

    match queue_repository.join(&target_word).await {
        Ok(response) => Ok(with_status(json(&response), StatusCode::OK)),
        Err(err) => Ok(store_failure(err)),
    }
}

async fn handle_leave_queue(
    body: SessionRequest,
    queue_repository: Arc<QueueRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let session_id: SessionId = match body.session_id.parse() {
        Ok(id) => id,
        Err(err) => return Ok(bad_request(err)),
    };

    match queue_repository.leave(session_id).await {
        Ok(()) => Ok(with_status(json(&AckResponse::ok()), StatusCode::OK)),
        Err(err) => Ok(store_failure(err)),
    }
}

async fn handle_queue_count(
    queue_repository: Arc<QueueRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    match queue_repository.waiting_count().await {
        Ok(waiting) => Ok(with_status(
            json(&duel_types::QueueCountResponse { waiting }),
            StatusCode::OK,
        )),
        Err(err) => Ok(store_failure(err)),
    }
}

async fn handle_queue_status(
    query: SessionQuery,
    queue_repository: Arc<QueueRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let session_id: SessionId = match query.session_id.parse() {
        Ok(id) => id,
        Err(err) => return Ok(bad_request(err)),
    };

    match queue_repository.lookup(session_id).await {
        Ok(response) => Ok(with_status(json(&response), StatusCode::OK)),
        Err(err) => Ok(store_failure(err)),
    }
}

async fn handle_get_match(
    match_id: String,
    match_repository: Arc<MatchRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let match_id: MatchId = match match_id.parse() {
        Ok(id) => id,
        Err(err) => return Ok(bad_request(err)),
    };

    match match_repository.get_match(match_id).await {
        Ok(view) => Ok(with_status(json(&view), StatusCode::OK)),
        Err(err) => Ok(read_failure(err)),
    }
}

async fn handle_get_player(
    match_id: String,
    query: SessionQuery,
    match_repository: Arc<MatchRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let (match_id, session_id) = match parse_pair(&match_id, &query.session_id) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    match match_repository.get_player_state(match_id, session_id).await {
        Ok(view) => Ok(with_status(json(&view), StatusCode::OK)),
        Err(err) => Ok(read_failure(err)),
    }
}

async fn handle_get_opponent(
    match_id: String,
    query: SessionQuery,
    match_repository: Arc<MatchRepository>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let (match_id, session_id) = match parse_pair(&match_id, &query.session_id) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    match match_repository
        .get_opponent_state(match_id, session_id)
        .await
    {
        Ok(view) => Ok(with_status(json(&view), StatusCode::OK)),
        Err(err) => Ok(read_failure(err)),
    }
}

async fn handle_submit_guess(
    match_id: String,
    body: GuessRequest,
    match_repository: Arc<MatchRepository>,
    word_list: Arc<WordList>,
    event_hub: Arc<MatchEventHub>,
    config: Config,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let (match_id, session_id) = match parse_pair(&match_id, &body.session_id) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    if !word_list.is_valid_word(&body.word) {
        let err = DomainError::WordNotInList {
            word: body.word.clone(),
        };
        return Ok(with_status(
            json(&GuessResponse::rejected(err.to_string())),
            StatusCode::OK,
        ));
    }

    match match_repository
        .submit_guess(match_id, session_id, &body.word, config.max_guesses)
        .await
    {
        Ok((letters, game_state)) => {
            event_hub.notify(match_id);
            Ok(with_status(
                json(&GuessResponse::accepted(letters, game_state)),
                StatusCode::OK,
            ))
        }
        Err(StoreError::Domain(err)) => Ok(with_status(
            json(&GuessResponse::rejected(err.to_string())),
            StatusCode::OK,
        )),
        Err(err) => {
            error!("Failed to submit guess: {}", err);
            Ok(with_status(
                json(&GuessResponse::rejected("Internal server error")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_current_guess(
    match_id: String,
    body: CurrentGuessRequest,
    match_repository: Arc<MatchRepository>,
    event_hub: Arc<MatchEventHub>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let (match_id, session_id) = match parse_pair(&match_id, &body.session_id) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    match match_repository
        .set_current_guess(match_id, session_id, &body.text)
        .await
    {
        Ok(()) => {
            event_hub.notify(match_id);
            Ok(with_status(json(&AckResponse::ok()), StatusCode::OK))
        }
        Err(err) => Ok(mutation_failure(err)),
    }
}

async fn handle_leave_match(
    match_id: String,
    body: SessionRequest,
    match_repository: Arc<MatchRepository>,
    event_hub: Arc<MatchEventHub>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let (match_id, session_id) = match parse_pair(&match_id, &body.session_id) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    match match_repository.leave_match(match_id, session_id).await {
        Ok(()) => {
            event_hub.notify(match_id);
            Ok(with_status(json(&AckResponse::ok()), StatusCode::OK))
        }
        Err(err) => Ok(mutation_failure(err)),
    }
}

async fn handle_leave_beacon(
    query: BeaconQuery,
    match_repository: Arc<MatchRepository>,
    event_hub: Arc<MatchEventHub>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let Some(match_id_raw) = query.match_id else {
        return Ok(bad_request("missing match_id"));
    };
    let Some(session_id_raw) = query.session_id else {
        return Ok(bad_request("missing session_id"));
    };

    let (match_id, session_id) = match parse_pair(&match_id_raw, &session_id_raw) {
        Ok(ids) => ids,
        Err(reply) => return Ok(reply),
    };

    match match_repository.leave_match(match_id, session_id).await {
        Ok(()) => {
            event_hub.notify(match_id);
            Ok(with_status(json(&AckResponse::ok()), StatusCode::OK))
        }
        Err(err) => Ok(mutation_failure(err)),
    }
}

fn parse_pair(
    match_id: &str,
    session_id: &str,
) -> Result<(MatchId, SessionId), WithStatus<Json>> {
    let match_id: MatchId = match_id.parse().map_err(bad_request)?;
    let session_id: SessionId = session_id.parse().map_err(bad_request)?;
    Ok((match_id, session_id))
}

fn bad_request(err: impl ToString) -> WithStatus<Json> {
    with_status(
        json(&AckResponse::rejected(err.to_string())),
        StatusCode::BAD_REQUEST,
    )
}

fn internal_error() -> WithStatus<Json> {
    with_status(
        json(&AckResponse::rejected("Internal server error")),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// Read endpoints surface domain problems as HTTP statuses.
fn read_failure(err: StoreError) -> WithStatus<Json> {
    match err {
        StoreError::Domain(err) => {
            let status = match err {
                DomainError::MatchNotFound => StatusCode::NOT_FOUND,
                DomainError::NotAParticipant => StatusCode::FORBIDDEN,
                _ => StatusCode::BAD_REQUEST,
            };
            with_status(json(&AckResponse::rejected(err.to_string())), status)
        }
        err => store_failure(err),
    }
}

/// Mutation endpoints carry domain problems inside the typed envelope so the
/// UI can show a message without treating the request as failed transport.
fn mutation_failure(err: StoreError) -> WithStatus<Json> {
    match err {
        StoreError::Domain(err) => with_status(
            json(&AckResponse::rejected(err.to_string())),
            StatusCode::OK,
        ),
        err => store_failure(err),
    }
}

fn store_failure(err: StoreError) -> WithStatus<Json> {
    error!("Store failure: {}", err);
    internal_error()
}
