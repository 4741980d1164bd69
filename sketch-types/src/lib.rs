pub mod events;
pub mod player;
pub mod snapshot;

// Re-export all types
pub use events::*;
pub use player::*;
pub use snapshot::*;
