use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::player::PlayerId;

/// Mid-round state sent to late joiners so a freshly connected client can
/// render the in-progress round instead of an idle screen. Carries the
/// revealed pattern, never the secret word itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSnapshot {
    pub running: bool,
    pub revealed_word: Option<String>,
    pub drawing_player_id: Option<PlayerId>,
    pub seconds_elapsed: u32,
}

impl GameSnapshot {
    pub fn idle() -> Self {
        Self {
            running: false,
            revealed_word: None,
            drawing_player_id: None,
            seconds_elapsed: 0,
        }
    }
}
