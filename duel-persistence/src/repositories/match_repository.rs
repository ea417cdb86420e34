use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{matches, player_states, prelude::*};
use crate::error::StoreError;
use duel_core::{is_winning_guess, score_guess};
use duel_types::{
    DomainError, MatchId, MatchStatus, MatchView, OpponentView, PlayerGameState, PlayerStateView,
    ScoredGuess, ScoredLetter, SessionId,
};

pub struct MatchRepository {
    db: DatabaseConnection,
}

impl MatchRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_match(&self, match_id: MatchId) -> Result<MatchView, StoreError> {
        let model = Matches::find_by_id(match_id.as_uuid())
            .one(&self.db)
            .await?
            .ok_or(DomainError::MatchNotFound)?;

        match_view(&model)
    }

    pub async fn get_player_state(
        &self,
        match_id: MatchId,
        session_id: SessionId,
    ) -> Result<PlayerStateView, StoreError> {
        let model = Matches::find_by_id(match_id.as_uuid())
            .one(&self.db)
            .await?
            .ok_or(DomainError::MatchNotFound)?;
        participant_check(&model, session_id)?;

        let row = find_player_row(&self.db, match_id, session_id).await?;
        player_view(row)
    }

    /// The sole sanctioned cross-player read: how far along the opponent is
    /// and whether they are done. Letters and colors never leave the store
    /// through this path.
    pub async fn get_opponent_state(
        &self,
        match_id: MatchId,
        session_id: SessionId,
    ) -> Result<OpponentView, StoreError> {
        let model = Matches::find_by_id(match_id.as_uuid())
            .one(&self.db)
            .await?
            .ok_or(DomainError::MatchNotFound)?;
        participant_check(&model, session_id)?;

        let opponent = opponent_of(&model, session_id);
        let row = find_player_row(&self.db, match_id, opponent).await?;

        Ok(OpponentView {
            guess_count: decode_guesses(&row.guesses)?.len() as u32,
            state: parse_player_state(&row.state)?,
            finished_at: row.finished_at.map(|t| t.to_rfc3339()),
        })
    }

    /// Store the in-progress guess text so a reloading client can restore it.
    pub async fn set_current_guess(
        &self,
        match_id: MatchId,
        session_id: SessionId,
        text: &str,
    ) -> Result<(), StoreError> {
        let model = Matches::find_by_id(match_id.as_uuid())
            .one(&self.db)
            .await?
            .ok_or(DomainError::MatchNotFound)?;
        participant_check(&model, session_id)?;

        let row = find_player_row(&self.db, match_id, session_id).await?;
        let mut active: player_states::ActiveModel = row.into();
        active.current_guess = Set(text.to_string());
        active.update(&self.db).await?;

        Ok(())
    }

    /// Evaluate and record a guess. One transaction covers the status checks,
    /// the append, and (on a win) closing the match, so two clients racing to
    /// win can never both be recorded: the loser of the race re-reads a match
    /// that already left playing and is rejected.
    pub async fn submit_guess(
        &self,
        match_id: MatchId,
        session_id: SessionId,
        word: &str,
        max_guesses: usize,
    ) -> Result<(Vec<ScoredLetter>, PlayerGameState), StoreError> {
        let word = word.trim().to_lowercase();
        let txn = self.db.begin().await?;

        let match_row = Matches::find_by_id(match_id.as_uuid())
            .one(&txn)
            .await?
            .ok_or(DomainError::MatchNotFound)?;
        participant_check(&match_row, session_id)?;

        if parse_match_status(&match_row)? != MatchStatus::Playing {
            return Err(DomainError::MatchNotPlaying.into());
        }

        let expected = match_row.target_word.chars().count() as i32;
        if word.chars().count() as i32 != expected {
            return Err(DomainError::WrongWordLength { expected }.into());
        }

        let player_row = find_player_row(&txn, match_id, session_id).await?;
        if parse_player_state(&player_row.state)? != PlayerGameState::Playing {
            return Err(DomainError::PlayerNotPlaying.into());
        }

        let mut guesses = decode_guesses(&player_row.guesses)?;
        if guesses.iter().any(|g| g.word == word) {
            return Err(DomainError::GuessAlreadyMade { word }.into());
        }

        let letters = score_guess(&word, &match_row.target_word);
        let won = is_winning_guess(&word, &match_row.target_word);
        let now: sea_orm::entity::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        guesses.push(ScoredGuess {
            word: word.clone(),
            letters: letters.clone(),
            submitted_at: now.to_rfc3339(),
        });

        let new_state = if won {
            PlayerGameState::Won
        } else if guesses.len() >= max_guesses {
            PlayerGameState::Lost
        } else {
            PlayerGameState::Playing
        };

        let mut active: player_states::ActiveModel = player_row.into();
        active.guesses = Set(encode_guesses(&guesses)?);
        active.current_guess = Set(String::new());
        active.state = Set(new_state.as_str().to_string());
        if new_state != PlayerGameState::Playing {
            active.finished_at = Set(Some(now));
        }
        active.update(&txn).await?;

        if won {
            let mut match_active: matches::ActiveModel = match_row.into();
            match_active.status = Set(MatchStatus::Finished.as_str().to_string());
            match_active.winner = Set(Some(session_id.as_uuid()));
            match_active.ended_at = Set(Some(now));
            match_active.update(&txn).await?;
        }

        txn.commit().await?;

        if won {
            info!("Session {} won match {}", session_id, match_id);
        }

        Ok((letters, new_state))
    }

    /// Mark the match abandoned on behalf of a leaving player. No-op once the
    /// match is already terminal, so a late beacon after a finished game
    /// cannot rewrite history.
    pub async fn leave_match(
        &self,
        match_id: MatchId,
        session_id: SessionId,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let match_row = Matches::find_by_id(match_id.as_uuid())
            .one(&txn)
            .await?
            .ok_or(DomainError::MatchNotFound)?;
        participant_check(&match_row, session_id)?;

        if parse_match_status(&match_row)? == MatchStatus::Playing {
            let mut active: matches::ActiveModel = match_row.into();
            active.status = Set(MatchStatus::Abandoned.as_str().to_string());
            active.abandoned_by = Set(Some(session_id.as_uuid()));
            active.ended_at = Set(Some(chrono::Utc::now().into()));
            active.update(&txn).await?;

            info!("Session {} abandoned match {}", session_id, match_id);
        }

        txn.commit().await?;
        Ok(())
    }
}

async fn find_player_row<C: sea_orm::ConnectionTrait>(
    conn: &C,
    match_id: MatchId,
    session_id: SessionId,
) -> Result<player_states::Model, StoreError> {
    PlayerStates::find()
        .filter(player_states::Column::MatchId.eq(match_id.as_uuid()))
        .filter(player_states::Column::SessionId.eq(session_id.as_uuid()))
        .one(conn)
        .await?
        .ok_or_else(|| {
            StoreError::Corrupt(format!(
                "missing player state for session {} in match {}",
                session_id, match_id
            ))
        })
}

fn participant_check(model: &matches::Model, session_id: SessionId) -> Result<(), StoreError> {
    if model.player_one == session_id.as_uuid() || model.player_two == session_id.as_uuid() {
        Ok(())
    } else {
        Err(DomainError::NotAParticipant.into())
    }
}

fn opponent_of(model: &matches::Model, session_id: SessionId) -> SessionId {
    if model.player_one == session_id.as_uuid() {
        SessionId::from(model.player_two)
    } else {
        SessionId::from(model.player_one)
    }
}

fn parse_match_status(model: &matches::Model) -> Result<MatchStatus, StoreError> {
    MatchStatus::parse(&model.status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown match status {:?}", model.status)))
}

fn parse_player_state(state: &str) -> Result<PlayerGameState, StoreError> {
    PlayerGameState::parse(state)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown player state {:?}", state)))
}

fn decode_guesses(json: &str) -> Result<Vec<ScoredGuess>, StoreError> {
    serde_json::from_str(json)
        .map_err(|e| StoreError::Corrupt(format!("undecodable guess history: {}", e)))
}

fn encode_guesses(guesses: &[ScoredGuess]) -> Result<String, StoreError> {
    serde_json::to_string(guesses)
        .map_err(|e| StoreError::Corrupt(format!("unencodable guess history: {}", e)))
}

fn match_view(model: &matches::Model) -> Result<MatchView, StoreError> {
    let status = parse_match_status(model)?;

    // The target stays hidden until the match is over
    let word = if status.is_terminal() {
        Some(model.target_word.clone())
    } else {
        None
    };

    Ok(MatchView {
        id: MatchId::from(model.id),
        status,
        word_length: model.target_word.chars().count() as i32,
        word,
        winner: model.winner.map(SessionId::from),
        abandoned_by: model.abandoned_by.map(SessionId::from),
        started_at: model.started_at.to_rfc3339(),
        ended_at: model.ended_at.map(|t| t.to_rfc3339()),
    })
}

fn player_view(model: player_states::Model) -> Result<PlayerStateView, StoreError> {
    Ok(PlayerStateView {
        match_id: MatchId::from(model.match_id),
        session_id: SessionId::from(model.session_id),
        guesses: decode_guesses(&model.guesses)?,
        current_guess: model.current_guess,
        state: parse_player_state(&model.state)?,
        finished_at: model.finished_at.map(|t| t.to_rfc3339()),
    })
}
