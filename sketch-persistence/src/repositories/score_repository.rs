use anyhow::Result;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use crate::entities::{players, prelude::*};

/// The persistence collaborator for player scores, keyed by display name.
/// Every operation is non-fatal to the session: callers log failures and
/// carry on with in-memory state.
pub struct ScoreRepository {
    db: DatabaseConnection,
}

impl ScoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_player_score(&self, name: &str) -> Result<Option<f64>> {
        let player = Players::find_by_id(name).one(&self.db).await?;
        Ok(player.map(|p| p.score))
    }

    pub async fn create_player(&self, name: &str, score: f64) -> Result<()> {
        let now = chrono::Utc::now().into();
        let player = players::ActiveModel {
            name: ActiveValue::Set(name.to_string()),
            score: ActiveValue::Set(score),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        Players::insert(player).exec(&self.db).await?;
        Ok(())
    }

    /// Overwrite a player's stored score, creating the row on first write.
    pub async fn set_player_score(&self, name: &str, score: f64) -> Result<()> {
        let existing = Players::find_by_id(name).one(&self.db).await?;

        match existing {
            Some(player) => {
                let updated = players::ActiveModel {
                    name: ActiveValue::Unchanged(player.name),
                    score: ActiveValue::Set(score),
                    created_at: ActiveValue::Unchanged(player.created_at),
                    updated_at: ActiveValue::Set(chrono::Utc::now().into()),
                };
                Players::update(updated).exec(&self.db).await?;
            }
            None => self.create_player(name, score).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> ScoreRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        ScoreRepository::new(db)
    }

    #[tokio::test]
    async fn test_missing_player_has_no_score() {
        let repo = setup_test_db().await;
        assert_eq!(repo.get_player_score("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_and_get_score() {
        let repo = setup_test_db().await;

        repo.create_player("alice", 120.0).await.unwrap();
        assert_eq!(repo.get_player_score("alice").await.unwrap(), Some(120.0));
    }

    #[tokio::test]
    async fn test_set_score_creates_then_updates() {
        let repo = setup_test_db().await;

        // First write creates the row
        repo.set_player_score("bob", 100.0).await.unwrap();
        assert_eq!(repo.get_player_score("bob").await.unwrap(), Some(100.0));

        // Later writes overwrite it
        repo.set_player_score("bob", 150.0).await.unwrap();
        assert_eq!(repo.get_player_score("bob").await.unwrap(), Some(150.0));
    }

    #[tokio::test]
    async fn test_fractional_scores_survive_round_trips() {
        let repo = setup_test_db().await;

        repo.set_player_score("carol", 120.2).await.unwrap();
        assert_eq!(repo.get_player_score("carol").await.unwrap(), Some(120.2));
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let repo = setup_test_db().await;

        repo.create_player("dave", 0.0).await.unwrap();
        assert!(repo.create_player("dave", 10.0).await.is_err());
    }
}
