use duel_types::DomainError;
use thiserror::Error;

/// Everything a repository call can fail with. Domain rejections travel to
/// the client as typed envelopes; database and corruption errors are logged
/// at the boundary and turned into a generic failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
