use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QueueEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QueueEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QueueEntries::SessionId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(QueueEntries::Status).string().not_null())
                    .col(
                        ColumnDef::new(QueueEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The pairing scan filters on status and orders by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_entries_status")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_queue_entries_created_at")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Matches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Matches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Matches::PlayerOne).string().not_null())
                    .col(ColumnDef::new(Matches::PlayerTwo).string().not_null())
                    .col(ColumnDef::new(Matches::TargetWord).string().not_null())
                    .col(ColumnDef::new(Matches::Status).string().not_null())
                    .col(ColumnDef::new(Matches::Winner).string().null())
                    .col(ColumnDef::new(Matches::AbandonedBy).string().null())
                    .col(
                        ColumnDef::new(Matches::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Matches::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Queue status lookups resolve a session to its live match
        manager
            .create_index(
                Index::create()
                    .name("idx_matches_player_one")
                    .table(Matches::Table)
                    .col(Matches::PlayerOne)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_matches_player_two")
                    .table(Matches::Table)
                    .col(Matches::PlayerTwo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlayerStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerStates::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerStates::MatchId).string().not_null())
                    .col(ColumnDef::new(PlayerStates::SessionId).string().not_null())
                    .col(ColumnDef::new(PlayerStates::Guesses).text().not_null())
                    .col(
                        ColumnDef::new(PlayerStates::CurrentGuess)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(PlayerStates::State).string().not_null())
                    .col(
                        ColumnDef::new(PlayerStates::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one row per participant per match
        manager
            .create_index(
                Index::create()
                    .name("idx_player_states_match_session")
                    .table(PlayerStates::Table)
                    .col(PlayerStates::MatchId)
                    .col(PlayerStates::SessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerStates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Matches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QueueEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QueueEntries {
    Table,
    Id,
    SessionId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Matches {
    Table,
    Id,
    PlayerOne,
    PlayerTwo,
    TargetWord,
    Status,
    Winner,
    AbandonedBy,
    StartedAt,
    EndedAt,
}

#[derive(DeriveIden)]
enum PlayerStates {
    Table,
    Id,
    MatchId,
    SessionId,
    Guesses,
    CurrentGuess,
    State,
    FinishedAt,
}
