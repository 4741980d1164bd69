use sketch_types::{Player, PlayerId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// Ids are connection-scoped and unique by construction, so hitting
    /// this means the caller registered the same connection twice.
    #[error("connection {0} already registered")]
    DuplicateConnection(PlayerId),
    #[error("no player registered for connection {0}")]
    NotFound(PlayerId),
}

/// The authoritative set of connected players, in join order.
///
/// Owns every `Player` exclusively; the session reads and mutates scores
/// only through here. Persistence synchronization is the caller's job.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly joined connection. `score` is seeded from the
    /// persisted lookup when one succeeded, 0 otherwise.
    pub fn add(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        score: f64,
    ) -> Result<&Player, RosterError> {
        if self.contains(id) {
            return Err(RosterError::DuplicateConnection(id));
        }
        self.players.push(Player {
            id,
            name: name.into(),
            score,
        });
        Ok(self.players.last().expect("just pushed"))
    }

    pub fn remove(&mut self, id: PlayerId) -> Result<Player, RosterError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(RosterError::NotFound(id))?;
        Ok(self.players.remove(index))
    }

    pub fn get(&self, id: PlayerId) -> Result<&Player, RosterError> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(RosterError::NotFound(id))
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Snapshot of every connected player, insertion order.
    pub fn all(&self) -> Vec<Player> {
        self.players.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Apply a score delta to an existing player. Never creates one: a
    /// score for an id that already left the session must not resurrect it.
    pub fn adjust_score(&mut self, id: PlayerId, delta: f64) -> Result<&Player, RosterError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RosterError::NotFound(id))?;
        player.score += delta;
        Ok(player)
    }
}
