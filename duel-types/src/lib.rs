pub mod api;
pub mod errors;
pub mod game;
pub mod ids;

// Re-export all types
pub use api::*;
pub use errors::*;
pub use game::*;
pub use ids::*;
