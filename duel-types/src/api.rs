use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{MatchId, MatchView, OpponentView, PlayerGameState, PlayerStateView, ScoredLetter, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QueueJoinStatus {
    Waiting,
    Matched,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JoinQueueResponse {
    pub status: QueueJoinStatus,
    pub session_id: SessionId,
    pub match_id: Option<MatchId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QueueLookupStatus {
    Waiting,
    Matched,
    Playing,
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QueueStatusResponse {
    pub status: QueueLookupStatus,
    pub match_id: Option<MatchId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QueueCountResponse {
    pub waiting: u64,
}

/// Request bodies carry identifiers as plain strings; the server parses them
/// into typed ids at the boundary and rejects malformed ones with 400.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRequest {
    pub session_id: String,
    pub word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrentGuessRequest {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letters: Option<Vec<ScoredLetter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<PlayerGameState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GuessResponse {
    pub fn accepted(letters: Vec<ScoredLetter>, game_state: PlayerGameState) -> Self {
        Self {
            success: true,
            letters: Some(letters),
            game_state: Some(game_state),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            letters: None,
            game_state: None,
            error: Some(error.into()),
        }
    }
}

/// Minimal success/error envelope shared by the leave, current-guess and
/// beacon endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    SubscribeMatch {
        match_id: String,
        session_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    MatchSnapshot {
        match_state: MatchView,
        you: PlayerStateView,
        opponent: OpponentView,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_response_envelopes() {
        let ok = GuessResponse::accepted(Vec::new(), PlayerGameState::Playing);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let rejected = GuessResponse::rejected("match is no longer in play");
        assert!(!rejected.success);
        assert!(rejected.letters.is_none());
        assert_eq!(rejected.error.as_deref(), Some("match is no longer in play"));
    }

    #[test]
    fn test_rejection_envelope_omits_empty_fields() {
        let json = serde_json::to_string(&GuessResponse::rejected("nope")).unwrap();
        assert!(!json.contains("letters"));
        assert!(!json.contains("game_state"));
    }
}
