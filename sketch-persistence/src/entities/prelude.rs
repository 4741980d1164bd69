pub use super::players::Entity as Players;
