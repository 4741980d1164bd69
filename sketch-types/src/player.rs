use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Connection-scoped identity: minted when the socket opens, discarded when
/// it closes. A refreshing browser gets a fresh id; continuity across
/// connections comes from the persisted score keyed by display name.
pub type PlayerId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Scores accumulate as reals: the drawing player's share of an award
    /// is a fraction of the guesser's and is never truncated.
    pub score: f64,
}
