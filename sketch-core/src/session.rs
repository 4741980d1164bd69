use std::collections::HashSet;

use sketch_types::{GameSnapshot, Player, PlayerId, ServerEvent};
use thiserror::Error;
use tracing::info;

use crate::mask;
use crate::roster::{Roster, RosterError};
use crate::scoring::ScoringPolicy;

/// Round timing constants. One instance per session; the defaults match
/// the classic 30-second round.
#[derive(Debug, Clone, Copy)]
pub struct SessionRules {
    pub round_seconds: u32,
    /// Elapsed second at which every third letter becomes visible.
    pub partial_reveal_at: u32,
    /// Delay between the last correct guess and the early-end check, so
    /// the final guess notice reaches everyone before the round stops.
    pub grace_seconds: u64,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            round_seconds: 30,
            partial_reveal_at: 15,
            grace_seconds: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    AllGuessed,
    DrawerLeft,
}

/// Who an event is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    AllExcept(PlayerId),
    One(PlayerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub target: Target,
    pub event: ServerEvent,
}

/// Timer work the boundary must perform on the session's behalf. The
/// round number stamps ticks and end checks so ones from a finished round
/// are recognized as stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    StartTicker { round: u64 },
    StopTicker,
    ScheduleEndCheck { round: u64, after_seconds: u64 },
}

/// What an operation wants the transport layer to do. The session never
/// performs I/O itself; every mutation returns one of these.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    pub emissions: Vec<Emission>,
    pub directives: Vec<Directive>,
}

impl Outcome {
    fn emit(&mut self, target: Target, event: ServerEvent) {
        self.emissions.push(Emission { target, event });
    }

    fn merge(&mut self, other: Outcome) {
        self.emissions.extend(other.emissions);
        self.directives.extend(other.directives);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartRoundError {
    #[error("a round is already running")]
    AlreadyRunning,
    #[error("drawing player {0} is not connected")]
    UnknownPlayer(PlayerId),
}

/// How a guess was resolved. `Miss` is relayable as chat; `Ignored`
/// submissions (from the drawer, or repeats from a player who already
/// guessed) are dropped so the word can never leak.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessVerdict {
    Correct {
        guesser: Player,
        drawer: Player,
        awarded: f64,
        drawer_awarded: f64,
    },
    Miss,
    Ignored,
}

#[derive(Debug)]
struct RoundState {
    word: String,
    revealed: String,
    drawer: PlayerId,
    elapsed: u32,
    correct_guessers: HashSet<PlayerId>,
}

/// The session state machine: one per game instance, mutated only from a
/// single logical event sequence. Owns the roster and the round; applies
/// the scoring policy; never touches a socket or a clock.
pub struct GameSession {
    rules: SessionRules,
    roster: Roster,
    round: Option<RoundState>,
    /// Bumped at every round start; stale ticks and end checks carry an
    /// older value and are ignored.
    round_seq: u64,
}

impl GameSession {
    pub fn new(rules: SessionRules) -> Self {
        Self {
            rules,
            roster: Roster::new(),
            round: None,
            round_seq: 0,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn phase(&self) -> Phase {
        if self.round.is_some() {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    pub fn round_seq(&self) -> u64 {
        self.round_seq
    }

    pub fn correct_guess_count(&self) -> usize {
        self.round
            .as_ref()
            .map(|r| r.correct_guessers.len())
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        match &self.round {
            Some(round) => GameSnapshot {
                running: true,
                revealed_word: Some(round.revealed.clone()),
                drawing_player_id: Some(round.drawer),
                seconds_elapsed: round.elapsed,
            },
            None => GameSnapshot::idle(),
        }
    }

    /// What a freshly connected client needs to render the current state:
    /// the roster plus the in-progress round, if any.
    pub fn catch_up(&self, id: PlayerId) -> Outcome {
        let mut out = Outcome::default();
        out.emit(
            Target::One(id),
            ServerEvent::AllPlayers {
                players: self.roster.all(),
            },
        );
        out.emit(
            Target::One(id),
            ServerEvent::GameState {
                snapshot: self.snapshot(),
            },
        );
        out
    }

    pub fn join(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        seed_score: f64,
    ) -> Result<Outcome, RosterError> {
        let player = self.roster.add(id, name, seed_score)?.clone();
        info!(player_id = %id, name = %player.name, score = player.score, "player joined");

        let mut out = Outcome::default();
        out.emit(Target::AllExcept(id), ServerEvent::PlayerJoined { player });
        out.emit(
            Target::All,
            ServerEvent::AllPlayers {
                players: self.roster.all(),
            },
        );
        Ok(out)
    }

    pub fn start_round(
        &mut self,
        word: String,
        drawer: PlayerId,
    ) -> Result<Outcome, StartRoundError> {
        if self.round.is_some() {
            return Err(StartRoundError::AlreadyRunning);
        }
        if !self.roster.contains(drawer) {
            return Err(StartRoundError::UnknownPlayer(drawer));
        }

        self.round_seq += 1;
        let revealed = mask::fully_masked(&word);
        info!(drawer = %drawer, round = self.round_seq, "round started");

        let mut out = Outcome::default();
        out.emit(
            Target::AllExcept(drawer),
            ServerEvent::RoundStarted {
                masked_word: revealed.clone(),
            },
        );
        out.emit(
            Target::One(drawer),
            ServerEvent::WordReveal { word: word.clone() },
        );
        out.directives.push(Directive::StartTicker {
            round: self.round_seq,
        });

        self.round = Some(RoundState {
            word,
            revealed,
            drawer,
            elapsed: 0,
            correct_guessers: HashSet::new(),
        });
        Ok(out)
    }

    /// Evaluate one guess. Out-of-phase or non-eligible submissions are
    /// no-ops, never errors: a player can only score once per round, and
    /// the drawer can never score as a guesser.
    pub fn submit_guess(&mut self, id: PlayerId, text: &str) -> (GuessVerdict, Outcome) {
        let mut out = Outcome::default();

        let (drawer, elapsed) = match &self.round {
            None => return (GuessVerdict::Miss, out),
            Some(round) => {
                if id == round.drawer || round.correct_guessers.contains(&id) {
                    return (GuessVerdict::Ignored, out);
                }
                if !self.roster.contains(id) {
                    return (GuessVerdict::Ignored, out);
                }
                if !mask::matches(text, &round.word) {
                    return (GuessVerdict::Miss, out);
                }
                (round.drawer, round.elapsed)
            }
        };

        let awarded = ScoringPolicy::score_for(elapsed);
        let drawer_awarded = ScoringPolicy::drawer_share(awarded);

        let guesser = match self.roster.adjust_score(id, awarded) {
            Ok(player) => player.clone(),
            // Checked present above; a failure here means the roster raced
            // the round, so drop the guess.
            Err(_) => return (GuessVerdict::Ignored, out),
        };
        let drawer_player = match self.roster.adjust_score(drawer, drawer_awarded) {
            Ok(player) => player.clone(),
            Err(_) => return (GuessVerdict::Ignored, out),
        };

        if let Some(round) = self.round.as_mut() {
            round.correct_guessers.insert(id);
        }
        info!(
            guesser = %id,
            elapsed,
            awarded,
            drawer_awarded,
            "correct guess"
        );

        out.emit(
            Target::One(id),
            ServerEvent::GuessedCorrectly {
                guesser_id: id,
                drawer_id: drawer,
                guesser_score: guesser.score,
                drawer_score: drawer_player.score,
            },
        );
        // The word itself never reaches the other players, only the award.
        out.emit(
            Target::AllExcept(id),
            ServerEvent::ChatRelay {
                sender_id: id,
                sender_name: guesser.name.clone(),
                text: format!("{} guessed the word! (+{:.0})", guesser.name, awarded),
            },
        );
        out.emit(
            Target::All,
            ServerEvent::AllPlayers {
                players: self.roster.all(),
            },
        );
        out.directives.push(Directive::ScheduleEndCheck {
            round: self.round_seq,
            after_seconds: self.rules.grace_seconds,
        });

        let verdict = GuessVerdict::Correct {
            guesser,
            drawer: drawer_player,
            awarded,
            drawer_awarded,
        };
        (verdict, out)
    }

    /// One second of round time. Reports the pre-increment elapsed value,
    /// fires any reveal checkpoint due at it, then advances the clock, so
    /// checkpoints land on consistent fencepost boundaries.
    pub fn tick(&mut self, round: u64) -> Outcome {
        let mut out = Outcome::default();
        if round != self.round_seq {
            return out;
        }
        let Some(state) = self.round.as_mut() else {
            return out;
        };

        let elapsed = state.elapsed;
        out.emit(
            Target::All,
            ServerEvent::TimeElapsed {
                seconds_remaining: self.rules.round_seconds.saturating_sub(elapsed),
            },
        );

        if elapsed == self.rules.partial_reveal_at {
            state.revealed = mask::partially_revealed(&state.word);
            out.emit(
                Target::All,
                ServerEvent::WordReveal {
                    word: state.revealed.clone(),
                },
            );
        }

        let time_up = elapsed >= self.rules.round_seconds;
        if time_up {
            out.emit(
                Target::All,
                ServerEvent::WordReveal {
                    word: state.word.clone(),
                },
            );
        } else {
            state.elapsed = elapsed + 1;
        }

        if time_up {
            out.merge(self.end_round(EndReason::TimeUp));
        }
        out
    }

    /// The grace-period callback. Re-checks the current phase and round:
    /// if the round already ended (or a newer one started) this is stale
    /// and must not touch anything.
    pub fn end_check(&mut self, round: u64) -> Outcome {
        if round != self.round_seq || !self.all_guessed() {
            return Outcome::default();
        }
        self.end_round(EndReason::AllGuessed)
    }

    pub fn end_round(&mut self, reason: EndReason) -> Outcome {
        let mut out = Outcome::default();
        if self.round.take().is_none() {
            return out;
        }
        info!(?reason, round = self.round_seq, "round ended");
        out.directives.push(Directive::StopTicker);
        out.emit(Target::All, ServerEvent::RoundStopped);
        out
    }

    /// Remove a departed connection. A departing drawer ends the round in
    /// the same step so no running round is left without its drawer; a
    /// departing guesser may leave everyone remaining already correct, in
    /// which case the round also ends here.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Outcome, RosterError> {
        let player = self.roster.remove(id)?;
        info!(player_id = %id, name = %player.name, "player removed");

        let mut out = Outcome::default();
        out.emit(Target::All, ServerEvent::PlayerLeft { player_id: id });

        let drawer_left = self.round.as_ref().is_some_and(|r| r.drawer == id);
        if drawer_left {
            out.merge(self.end_round(EndReason::DrawerLeft));
        } else if self.round.is_some() && self.all_guessed() {
            out.merge(self.end_round(EndReason::AllGuessed));
        }
        Ok(out)
    }

    /// True when every connected player except the drawer has guessed
    /// correctly. Judged against the live roster, so departed guessers
    /// don't count toward it and departed holdouts stop blocking it.
    fn all_guessed(&self) -> bool {
        let Some(round) = &self.round else {
            return false;
        };
        self.roster
            .iter()
            .filter(|p| p.id != round.drawer)
            .all(|p| round.correct_guessers.contains(&p.id))
    }
}
