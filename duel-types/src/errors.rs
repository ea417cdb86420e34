use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Domain-level rejections. These travel to the client as a typed
/// `{success: false, error}` envelope rather than an HTTP failure, so the UI
/// can show a message without surfacing a stack trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub enum DomainError {
    #[error("match not found")]
    MatchNotFound,
    #[error("you are not part of this match")]
    NotAParticipant,
    #[error("match is no longer in play")]
    MatchNotPlaying,
    #[error("you have already finished this match")]
    PlayerNotPlaying,
    #[error("guess must be exactly {expected} letters")]
    WrongWordLength { expected: i32 },
    #[error("not a playable word: {word}")]
    WordNotInList { word: String },
    #[error("you already guessed {word}")]
    GuessAlreadyMade { word: String },
}
