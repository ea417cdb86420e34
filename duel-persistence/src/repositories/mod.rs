pub mod match_repository;
pub mod queue_repository;

pub use match_repository::MatchRepository;
pub use queue_repository::QueueRepository;
