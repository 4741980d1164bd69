use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::player::{Player, PlayerId};
use crate::snapshot::GameSnapshot;

/// Everything a client may send over the socket. A closed enumeration shared
/// with the client build keeps event names out of string literals on both
/// sides of the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientEvent {
    Join { name: String },
    StartRound,
    Guess { text: String },
    DrawingFrame { data: String },
    ClearCanvas,
}

/// Everything the session may push to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerEvent {
    PlayerJoined {
        player: Player,
    },
    AllPlayers {
        players: Vec<Player>,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    /// Broadcast to everyone except the drawer at round start.
    RoundStarted {
        masked_word: String,
    },
    /// Unicast to the drawer at round start; broadcast at reveal
    /// checkpoints and at time-up with progressively more letters visible.
    WordReveal {
        word: String,
    },
    RoundStopped,
    GuessedCorrectly {
        guesser_id: PlayerId,
        drawer_id: PlayerId,
        guesser_score: f64,
        drawer_score: f64,
    },
    ChatRelay {
        sender_id: PlayerId,
        sender_name: String,
        text: String,
    },
    DrawingFrame {
        data: String,
    },
    CanvasCleared,
    TimeElapsed {
        seconds_remaining: u32,
    },
    GameState {
        snapshot: GameSnapshot,
    },
}
