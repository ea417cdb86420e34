use crate::{MatchId, SessionId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MatchStatus {
    Playing,   // Both players still guessing
    Finished,  // Someone hit the target word
    Abandoned, // A player left mid-match
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Playing => "playing",
            MatchStatus::Finished => "finished",
            MatchStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "playing" => Some(MatchStatus::Playing),
            "finished" => Some(MatchStatus::Finished),
            "abandoned" => Some(MatchStatus::Abandoned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MatchStatus::Playing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PlayerGameState {
    Playing,
    Won,
    Lost,
}

impl PlayerGameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerGameState::Playing => "playing",
            PlayerGameState::Won => "won",
            PlayerGameState::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "playing" => Some(PlayerGameState::Playing),
            "won" => Some(PlayerGameState::Won),
            "lost" => Some(PlayerGameState::Lost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QueueEntryStatus {
    Waiting,
    Matched,
    Cancelled,
}

impl QueueEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueEntryStatus::Waiting => "waiting",
            QueueEntryStatus::Matched => "matched",
            QueueEntryStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(QueueEntryStatus::Waiting),
            "matched" => Some(QueueEntryStatus::Matched),
            "cancelled" => Some(QueueEntryStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LetterStatus {
    Correct, // Right letter, right position
    Present, // Right letter, wrong position
    Absent,  // Letter not in word
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoredLetter {
    pub letter: String,
    pub status: LetterStatus,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoredGuess {
    pub word: String,
    pub letters: Vec<ScoredLetter>,
    pub submitted_at: String, // ISO 8601 string
}

/// Client-facing view of a match. The target word stays hidden while the
/// match is in play; once the match reaches a terminal status it is revealed
/// so the loser sees what they were chasing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MatchView {
    pub id: MatchId,
    pub status: MatchStatus,
    pub word_length: i32,
    pub word: Option<String>,
    pub winner: Option<SessionId>,
    pub abandoned_by: Option<SessionId>,
    pub started_at: String, // ISO 8601 string
    pub ended_at: Option<String>,
}

/// One participant's private half of a match: full guess history with colors,
/// the in-progress guess text, and the terminal outcome. Only ever served to
/// the session that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerStateView {
    pub match_id: MatchId,
    pub session_id: SessionId,
    pub guesses: Vec<ScoredGuess>,
    pub current_guess: String,
    pub state: PlayerGameState,
    pub finished_at: Option<String>,
}

/// What a player is allowed to learn about their opponent: how many guesses
/// they have used and whether they are done. No letters, no colors.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpponentView {
    pub guess_count: u32,
    pub state: PlayerGameState,
    pub finished_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trips() {
        for status in [
            MatchStatus::Playing,
            MatchStatus::Finished,
            MatchStatus::Abandoned,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
        for state in [
            PlayerGameState::Playing,
            PlayerGameState::Won,
            PlayerGameState::Lost,
        ] {
            assert_eq!(PlayerGameState::parse(state.as_str()), Some(state));
        }
        for status in [
            QueueEntryStatus::Waiting,
            QueueEntryStatus::Matched,
            QueueEntryStatus::Cancelled,
        ] {
            assert_eq!(QueueEntryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("bogus"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!MatchStatus::Playing.is_terminal());
        assert!(MatchStatus::Finished.is_terminal());
        assert!(MatchStatus::Abandoned.is_terminal());
    }
}
