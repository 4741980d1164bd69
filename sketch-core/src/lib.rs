pub mod mask;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod words;

// Re-export main components
pub use mask::*;
pub use roster::*;
pub use scoring::*;
pub use session::*;
pub use words::*;
