use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{matches, player_states, prelude::*, queue_entries};
use crate::error::StoreError;
use duel_types::{
    JoinQueueResponse, MatchId, MatchStatus, PlayerGameState, QueueEntryStatus, QueueJoinStatus,
    QueueLookupStatus, QueueStatusResponse, SessionId,
};

pub struct QueueRepository {
    db: DatabaseConnection,
}

impl QueueRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Join the matchmaking queue under a freshly minted session id.
    ///
    /// Pairs with the oldest waiting entry if there is one: that entry is
    /// marked matched and the Match plus both PlayerState rows are inserted in
    /// the same transaction. Otherwise a new waiting entry is stored. The
    /// caller supplies the target word candidate; it is only used when a pair
    /// actually forms.
    pub async fn join(&self, target_word: &str) -> Result<JoinQueueResponse, StoreError> {
        let session_id = SessionId::generate();
        let txn = self.db.begin().await?;

        let waiting = QueueEntries::find()
            .filter(queue_entries::Column::Status.eq(QueueEntryStatus::Waiting.as_str()))
            .order_by_asc(queue_entries::Column::CreatedAt)
            .one(&txn)
            .await?;

        if let Some(entry) = waiting {
            // Guard against a concurrent join claiming the same entry between
            // our scan and our write: the update only lands if the entry is
            // still waiting.
            let claimed = QueueEntries::update_many()
                .col_expr(
                    queue_entries::Column::Status,
                    Expr::value(QueueEntryStatus::Matched.as_str()),
                )
                .filter(queue_entries::Column::Id.eq(entry.id))
                .filter(queue_entries::Column::Status.eq(QueueEntryStatus::Waiting.as_str()))
                .exec(&txn)
                .await?;

            if claimed.rows_affected == 1 {
                let opponent = SessionId::from(entry.session_id);
                let match_id = MatchId::generate();
                let now: sea_orm::entity::prelude::DateTimeWithTimeZone =
                    chrono::Utc::now().into();

                matches::ActiveModel {
                    id: Set(match_id.as_uuid()),
                    player_one: Set(opponent.as_uuid()),
                    player_two: Set(session_id.as_uuid()),
                    target_word: Set(target_word.to_lowercase()),
                    status: Set(MatchStatus::Playing.as_str().to_string()),
                    winner: Set(None),
                    abandoned_by: Set(None),
                    started_at: Set(now),
                    ended_at: Set(None),
                }
                .insert(&txn)
                .await?;

                for participant in [opponent, session_id] {
                    player_states::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        match_id: Set(match_id.as_uuid()),
                        session_id: Set(participant.as_uuid()),
                        guesses: Set("[]".to_string()),
                        current_guess: Set(String::new()),
                        state: Set(PlayerGameState::Playing.as_str().to_string()),
                        finished_at: Set(None),
                    }
                    .insert(&txn)
                    .await?;
                }

                txn.commit().await?;
                info!("Paired {} with {} in match {}", session_id, opponent, match_id);

                return Ok(JoinQueueResponse {
                    status: QueueJoinStatus::Matched,
                    session_id,
                    match_id: Some(match_id),
                });
            }
        }

        queue_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id.as_uuid()),
            status: Set(QueueEntryStatus::Waiting.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!("Session {} waiting in queue", session_id);

        Ok(JoinQueueResponse {
            status: QueueJoinStatus::Waiting,
            session_id,
            match_id: None,
        })
    }

    /// Cancel the caller's waiting entry. No-op if the entry was already
    /// matched, cancelled, or never existed.
    pub async fn leave(&self, session_id: SessionId) -> Result<(), StoreError> {
        QueueEntries::update_many()
            .col_expr(
                queue_entries::Column::Status,
                Expr::value(QueueEntryStatus::Cancelled.as_str()),
            )
            .filter(queue_entries::Column::SessionId.eq(session_id.as_uuid()))
            .filter(queue_entries::Column::Status.eq(QueueEntryStatus::Waiting.as_str()))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn waiting_count(&self) -> Result<u64, StoreError> {
        let count = QueueEntries::find()
            .filter(queue_entries::Column::Status.eq(QueueEntryStatus::Waiting.as_str()))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    /// Resolve a session to its queue/match situation: playing if it is in a
    /// live match, matched if it was paired, waiting if still queued,
    /// not_found otherwise.
    pub async fn lookup(&self, session_id: SessionId) -> Result<QueueStatusResponse, StoreError> {
        let paired = Matches::find()
            .filter(
                Condition::any()
                    .add(matches::Column::PlayerOne.eq(session_id.as_uuid()))
                    .add(matches::Column::PlayerTwo.eq(session_id.as_uuid())),
            )
            .order_by_desc(matches::Column::StartedAt)
            .one(&self.db)
            .await?;

        if let Some(m) = paired {
            let status = MatchStatus::parse(&m.status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown match status {:?}", m.status)))?;
            let lookup_status = if status == MatchStatus::Playing {
                QueueLookupStatus::Playing
            } else {
                QueueLookupStatus::Matched
            };
            return Ok(QueueStatusResponse {
                status: lookup_status,
                match_id: Some(MatchId::from(m.id)),
            });
        }

        let entry = QueueEntries::find()
            .filter(queue_entries::Column::SessionId.eq(session_id.as_uuid()))
            .one(&self.db)
            .await?;

        let status = match entry {
            Some(e) if e.status == QueueEntryStatus::Waiting.as_str() => QueueLookupStatus::Waiting,
            _ => QueueLookupStatus::NotFound,
        };

        Ok(QueueStatusResponse {
            status,
            match_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> DatabaseConnection {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_first_join_waits() {
        let repo = QueueRepository::new(setup_test_db().await);

        let response = repo.join("kalem").await.unwrap();
        assert_eq!(response.status, QueueJoinStatus::Waiting);
        assert!(response.match_id.is_none());
        assert_eq!(repo.waiting_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_join_pairs_with_first() {
        let db = setup_test_db().await;
        let repo = QueueRepository::new(db.clone());

        let first = repo.join("kalem").await.unwrap();
        let second = repo.join("kalem").await.unwrap();

        assert_eq!(second.status, QueueJoinStatus::Matched);
        let match_id = second.match_id.expect("pairing should produce a match id");

        // The first joiner discovers the same match through a status check
        let lookup = repo.lookup(first.session_id).await.unwrap();
        assert_eq!(lookup.status, QueueLookupStatus::Playing);
        assert_eq!(lookup.match_id, Some(match_id));

        // Exactly two player state rows exist for the match
        let states = PlayerStates::find()
            .filter(player_states::Column::MatchId.eq(match_id.as_uuid()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(states.len(), 2);
        let sessions: Vec<Uuid> = states.iter().map(|s| s.session_id).collect();
        assert!(sessions.contains(&first.session_id.as_uuid()));
        assert!(sessions.contains(&second.session_id.as_uuid()));

        // The queue entry is marked, not deleted
        let entry = QueueEntries::find()
            .filter(queue_entries::Column::SessionId.eq(first.session_id.as_uuid()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Matched.as_str());
        assert_eq!(repo.waiting_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pairing_is_oldest_first() {
        let db = setup_test_db().await;
        let repo = QueueRepository::new(db.clone());

        // Seed two waiting entries with staggered creation times, oldest last
        // in insertion order so the scan has to actually sort.
        let newer = Uuid::new_v4();
        let older = Uuid::new_v4();
        let base = chrono::Utc::now();
        for (session, offset) in [(newer, 0), (older, -60)] {
            queue_entries::ActiveModel {
                id: Set(Uuid::new_v4()),
                session_id: Set(session),
                status: Set(QueueEntryStatus::Waiting.as_str().to_string()),
                created_at: Set((base + chrono::Duration::seconds(offset)).into()),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let joined = repo.join("kalem").await.unwrap();
        assert_eq!(joined.status, QueueJoinStatus::Matched);

        let older_entry = QueueEntries::find()
            .filter(queue_entries::Column::SessionId.eq(older))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let newer_entry = QueueEntries::find()
            .filter(queue_entries::Column::SessionId.eq(newer))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(older_entry.status, QueueEntryStatus::Matched.as_str());
        assert_eq!(newer_entry.status, QueueEntryStatus::Waiting.as_str());
    }

    #[tokio::test]
    async fn test_leave_cancels_waiting_entry() {
        let repo = QueueRepository::new(setup_test_db().await);

        let joined = repo.join("kalem").await.unwrap();
        assert_eq!(repo.waiting_count().await.unwrap(), 1);

        repo.leave(joined.session_id).await.unwrap();
        assert_eq!(repo.waiting_count().await.unwrap(), 0);

        let lookup = repo.lookup(joined.session_id).await.unwrap();
        assert_eq!(lookup.status, QueueLookupStatus::NotFound);
    }

    #[tokio::test]
    async fn test_leave_after_pairing_is_noop() {
        let db = setup_test_db().await;
        let repo = QueueRepository::new(db.clone());

        let first = repo.join("kalem").await.unwrap();
        let second = repo.join("kalem").await.unwrap();
        assert_eq!(second.status, QueueJoinStatus::Matched);

        // A stale leave from the first client must not unwind the pairing
        repo.leave(first.session_id).await.unwrap();

        let entry = QueueEntries::find()
            .filter(queue_entries::Column::SessionId.eq(first.session_id.as_uuid()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, QueueEntryStatus::Matched.as_str());
    }

    #[tokio::test]
    async fn test_leave_unknown_session_is_noop() {
        let repo = QueueRepository::new(setup_test_db().await);
        repo.leave(SessionId::generate()).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_unknown_session() {
        let repo = QueueRepository::new(setup_test_db().await);
        let lookup = repo.lookup(SessionId::generate()).await.unwrap();
        assert_eq!(lookup.status, QueueLookupStatus::NotFound);
        assert!(lookup.match_id.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_entry_does_not_pair() {
        let repo = QueueRepository::new(setup_test_db().await);

        let first = repo.join("kalem").await.unwrap();
        repo.leave(first.session_id).await.unwrap();

        let second = repo.join("kalem").await.unwrap();
        assert_eq!(second.status, QueueJoinStatus::Waiting);
    }
}
