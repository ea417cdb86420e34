pub use super::matches::Entity as Matches;
pub use super::player_states::Entity as PlayerStates;
pub use super::queue_entries::Entity as QueueEntries;
