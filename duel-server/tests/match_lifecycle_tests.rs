
use duel_types::{
    AckResponse, GuessResponse, MatchStatus, MatchView, OpponentView, PlayerGameState,
    PlayerStateView, QueueCountResponse, QueueJoinStatus, QueueLookupStatus, QueueStatusResponse,
};
use sea_orm::EntityTrait;
use test_helpers::{build_app, get_json, join, post_json};

use duel_persistence::entities::prelude::Matches;

#[tokio::test]
async fn test_full_duel_over_http() {
    let (app, db) = build_app().await;

    // First player waits
    let alice = join(&app).await;
    assert_eq!(alice.status, QueueJoinStatus::Waiting);

    let status: QueueStatusResponse = get_json(
        &app,
        &format!("/queue/status?session_id={}", alice.session_id),
    )
    .await;
    assert_eq!(status.status, QueueLookupStatus::Waiting);

    // Second player pairs with them
    let bob = join(&app).await;
    assert_eq!(bob.status, QueueJoinStatus::Matched);
    let match_id = bob.match_id.unwrap();

    let status: QueueStatusResponse = get_json(
        &app,
        &format!("/queue/status?session_id={}", alice.session_id),
    )
    .await;
    assert_eq!(status.status, QueueLookupStatus::Playing);
    assert_eq!(status.match_id, Some(match_id));

    // Tests may look at the hidden target; clients cannot
    let target = Matches::find_by_id(match_id.as_uuid())
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .target_word;
    let miss = if target == "kalem" { "kamer" } else { "kalem" };

    // Alice burns a guess
    let response = post_json(
        &format!("/match/{}/guess", match_id),
        serde_json::json!({"session_id": alice.session_id.to_string(), "word": miss}),
    )
    .reply(&app)
    .await;
    let body: GuessResponse = serde_json::from_slice(response.body()).unwrap();
    assert!(body.success);
    assert_eq!(body.game_state, Some(PlayerGameState::Playing));

    // Bob solves it
    let response = post_json(
        &format!("/match/{}/guess", match_id),
        serde_json::json!({"session_id": bob.session_id.to_string(), "word": target}),
    )
    .reply(&app)
    .await;
    let body: GuessResponse = serde_json::from_slice(response.body()).unwrap();
    assert!(body.success);
    assert_eq!(body.game_state, Some(PlayerGameState::Won));

    // Alice's own winning mutation arrives too late
    let response = post_json(
        &format!("/match/{}/guess", match_id),
        serde_json::json!({"session_id": alice.session_id.to_string(), "word": target}),
    )
    .reply(&app)
    .await;
    let body: GuessResponse = serde_json::from_slice(response.body()).unwrap();
    assert!(!body.success);

    // Exactly one winner on the closed match, word now revealed
    let view: MatchView = get_json(&app, &format!("/match/{}", match_id)).await;
    assert_eq!(view.status, MatchStatus::Finished);
    assert_eq!(view.winner, Some(bob.session_id));
    assert_eq!(view.word.as_deref(), Some(target.as_str()));
    assert!(view.ended_at.is_some());

    // A late beacon from the loser does not rewrite the result
    let response = warp::test::request()
        .method("POST")
        .path(&format!(
            "/leave-beacon?match_id={}&session_id={}",
            match_id, alice.session_id
        ))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);

    let view: MatchView = get_json(&app, &format!("/match/{}", match_id)).await;
    assert_eq!(view.status, MatchStatus::Finished);
    assert!(view.abandoned_by.is_none());
}

#[tokio::test]
async fn test_abandonment_over_beacon() {
    let (app, _db) = build_app().await;

    let alice = join(&app).await;
    let bob = join(&app).await;
    let match_id = bob.match_id.unwrap();

    // Alice's tab closes; the unload handler fires the beacon
    let response = warp::test::request()
        .method("POST")
        .path(&format!(
            "/leave-beacon?match_id={}&session_id={}",
            match_id, alice.session_id
        ))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);
    let body: AckResponse = serde_json::from_slice(response.body()).unwrap();
    assert!(body.success);

    // Bob's next read shows the abandonment
    let view: MatchView = get_json(&app, &format!("/match/{}", match_id)).await;
    assert_eq!(view.status, MatchStatus::Abandoned);
    assert_eq!(view.abandoned_by, Some(alice.session_id));

    // And no further guessing is possible
    let response = post_json(
        &format!("/match/{}/guess", match_id),
        serde_json::json!({"session_id": bob.session_id.to_string(), "word": "kalem"}),
    )
    .reply(&app)
    .await;
    let body: GuessResponse = serde_json::from_slice(response.body()).unwrap();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("no longer in play"));
}

#[tokio::test]
async fn test_blind_play_guarantee() {
    let (app, db) = build_app().await;

    let alice = join(&app).await;
    let bob = join(&app).await;
    let match_id = bob.match_id.unwrap();

    let target = Matches::find_by_id(match_id.as_uuid())
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .target_word;
    let miss = if target == "malek" { "kamer" } else { "malek" };

    post_json(
        &format!("/match/{}/guess", match_id),
        serde_json::json!({"session_id": alice.session_id.to_string(), "word": miss}),
    )
    .reply(&app)
    .await;

    // Alice sees her own letters and colors in full
    let own: PlayerStateView = get_json(
        &app,
        &format!("/match/{}/player?session_id={}", match_id, alice.session_id),
    )
    .await;
    assert_eq!(own.guesses.len(), 1);
    assert_eq!(own.guesses[0].word, miss);
    assert_eq!(own.guesses[0].letters.len(), 5);

    // Bob's view of Alice is count and state only; the raw body leaks nothing
    let response = warp::test::request()
        .method("GET")
        .path(&format!(
            "/match/{}/opponent?session_id={}",
            match_id, bob.session_id
        ))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);
    let raw = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(!raw.contains("letter"));
    assert!(!raw.contains("status\":\"Correct"));
    assert!(!raw.contains(miss));

    let opponent: OpponentView = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(opponent.guess_count, 1);
    assert_eq!(opponent.state, PlayerGameState::Playing);

    // The match view leaks nothing mid-game either
    let raw_match = warp::test::request()
        .method("GET")
        .path(&format!("/match/{}", match_id))
        .reply(&app)
        .await;
    let raw_match = String::from_utf8(raw_match.body().to_vec()).unwrap();
    assert!(!raw_match.contains(&target));
}

#[tokio::test]
async fn test_requeue_after_cancel() {
    let (app, _db) = build_app().await;

    let first = join(&app).await;
    assert_eq!(first.status, QueueJoinStatus::Waiting);

    let response = post_json(
        "/queue/leave",
        serde_json::json!({"session_id": first.session_id.to_string()}),
    )
    .reply(&app)
    .await;
    assert_eq!(response.status(), 200);

    let count: QueueCountResponse = get_json(&app, "/queue/count").await;
    assert_eq!(count.waiting, 0);

    // The cancelled entry is dead; a new join starts a fresh wait
    let second = join(&app).await;
    assert_eq!(second.status, QueueJoinStatus::Waiting);
    assert_ne!(second.session_id, first.session_id);

    let count: QueueCountResponse = get_json(&app, "/queue/count").await;
    assert_eq!(count.waiting, 1);

    let status: QueueStatusResponse = get_json(
        &app,
        &format!("/queue/status?session_id={}", first.session_id),
    )
    .await;
    assert_eq!(status.status, QueueLookupStatus::NotFound);
}
