use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::ticker::{RoundTicker, schedule_end_check};
use crate::websocket::ConnectionManager;
use sketch_core::{
    Directive, Emission, GameSession, GuessVerdict, Outcome, SessionRules, Target, WordBank,
};
use sketch_persistence::ScoreRepository;
use sketch_types::{Player, PlayerId, ServerEvent};

/// Every way the session can be poked: client events mapped by the socket
/// layer, connection lifecycle, and the session's own timers. All of them
/// arrive through one queue, so no two mutations ever interleave.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Connected { id: PlayerId },
    Join { id: PlayerId, name: String },
    StartRound { id: PlayerId },
    Guess { id: PlayerId, text: String },
    DrawingFrame { id: PlayerId, data: String },
    ClearCanvas { id: PlayerId },
    Disconnected { id: PlayerId },
    Tick { round: u64 },
    EndCheck { round: u64 },
}

/// Cheap cloneable handle for pushing commands at the coordinator task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) {
        // A send failure means the coordinator task is gone; the server is
        // shutting down and there is nobody left to tell.
        let _ = self.tx.send(command);
    }
}

/// Binds the transport to the game session: validates and maps inbound
/// events to session operations, executes the emission instructions and
/// timer directives they return, and shields the session from collaborator
/// failures (persistence, word source).
pub struct SessionCoordinator {
    session: GameSession,
    words: WordBank,
    connections: Arc<ConnectionManager>,
    scores: Option<Arc<ScoreRepository>>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    ticker: Option<RoundTicker>,
}

impl SessionCoordinator {
    /// Spawn the coordinator task and return the handle used to feed it.
    pub fn spawn(
        rules: SessionRules,
        words: WordBank,
        connections: Arc<ConnectionManager>,
        scores: Option<Arc<ScoreRepository>>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            session: GameSession::new(rules),
            words,
            connections,
            scores,
            commands: tx.clone(),
            ticker: None,
        };
        tokio::spawn(coordinator.run(rx));

        SessionHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }
        info!("session coordinator stopped");
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connected { id } => {
                let out = self.session.catch_up(id);
                self.apply(out).await;
            }
            SessionCommand::Join { id, name } => {
                let seed_score = self.lookup_score(&name).await;
                match self.session.join(id, name, seed_score) {
                    Ok(out) => self.apply(out).await,
                    Err(e) => warn!(player_id = %id, error = %e, "join rejected"),
                }
            }
            SessionCommand::StartRound { id } => {
                let word = match self.words.pick() {
                    Ok(word) => word,
                    Err(e) => {
                        warn!(player_id = %id, error = %e, "cannot start round");
                        return;
                    }
                };
                match self.session.start_round(word, id) {
                    Ok(out) => self.apply(out).await,
                    Err(e) => info!(player_id = %id, error = %e, "start request rejected"),
                }
            }
            SessionCommand::Guess { id, text } => {
                let (verdict, out) = self.session.submit_guess(id, &text);
                self.apply(out).await;
                match verdict {
                    GuessVerdict::Correct {
                        guesser, drawer, ..
                    } => self.persist_scores(guesser, drawer),
                    GuessVerdict::Miss => self.relay_chat(id, text).await,
                    GuessVerdict::Ignored => {}
                }
            }
            SessionCommand::DrawingFrame { id, data } => {
                self.connections
                    .broadcast_except(id, ServerEvent::DrawingFrame { data })
                    .await;
            }
            SessionCommand::ClearCanvas { id } => {
                self.connections
                    .broadcast_except(id, ServerEvent::CanvasCleared)
                    .await;
            }
            SessionCommand::Disconnected { id } => {
                // Connections that never joined aren't in the roster
                if let Ok(out) = self.session.remove_player(id) {
                    self.apply(out).await;
                }
            }
            SessionCommand::Tick { round } => {
                let out = self.session.tick(round);
                self.apply(out).await;
            }
            SessionCommand::EndCheck { round } => {
                let out = self.session.end_check(round);
                self.apply(out).await;
            }
        }
    }

    /// Execute what the session asked for: deliver each emission to its
    /// target set and act on the timer directives.
    async fn apply(&mut self, out: Outcome) {
        for Emission { target, event } in out.emissions {
            match target {
                Target::All => self.connections.broadcast(event).await,
                Target::AllExcept(id) => self.connections.broadcast_except(id, event).await,
                Target::One(id) => {
                    if let Err(e) = self.connections.send_to(id, event).await {
                        warn!(player_id = %id, error = %e, "failed to deliver event");
                    }
                }
            }
        }

        for directive in out.directives {
            match directive {
                Directive::StartTicker { round } => {
                    self.ticker = Some(RoundTicker::spawn(self.commands.clone(), round));
                }
                Directive::StopTicker => {
                    self.ticker = None;
                }
                Directive::ScheduleEndCheck {
                    round,
                    after_seconds,
                } => {
                    schedule_end_check(
                        self.commands.clone(),
                        round,
                        Duration::from_secs(after_seconds),
                    );
                }
            }
        }
    }

    async fn relay_chat(&self, sender_id: PlayerId, text: String) {
        // Only joined players get to chat
        let Ok(sender) = self.session.roster().get(sender_id) else {
            return;
        };
        self.connections
            .broadcast_except(
                sender_id,
                ServerEvent::ChatRelay {
                    sender_id,
                    sender_name: sender.name.clone(),
                    text,
                },
            )
            .await;
    }

    async fn lookup_score(&self, name: &str) -> f64 {
        let Some(repo) = &self.scores else {
            return 0.0;
        };
        match repo.get_player_score(name).await {
            Ok(Some(score)) => score,
            Ok(None) => 0.0,
            Err(e) => {
                warn!(player = name, error = %e, "score lookup failed, defaulting to 0");
                0.0
            }
        }
    }

    /// Persist both updated scores off the game path. Failures are logged
    /// and never block or roll back gameplay.
    fn persist_scores(&self, guesser: Player, drawer: Player) {
        let Some(repo) = &self.scores else { return };
        let repo = repo.clone();
        tokio::spawn(async move {
            for player in [guesser, drawer] {
                if let Err(e) = repo.set_player_score(&player.name, player.score).await {
                    warn!(player = %player.name, error = %e, "failed to persist score");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_types::ServerEvent;
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    struct TestClient {
        id: PlayerId,
        rx: UnboundedReceiver<ServerEvent>,
    }

    impl TestClient {
        async fn recv(&mut self) -> ServerEvent {
            tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("connection channel closed")
        }

        fn assert_no_canvas_events(&mut self) {
            while let Ok(event) = self.rx.try_recv() {
                assert!(
                    !matches!(
                        event,
                        ServerEvent::DrawingFrame { .. } | ServerEvent::CanvasCleared
                    ),
                    "sender received their own canvas event: {event:?}"
                );
            }
        }
    }

    async fn connect_and_join(
        connections: &Arc<ConnectionManager>,
        session: &SessionHandle,
        name: &str,
    ) -> TestClient {
        let id = Uuid::new_v4();
        let rx = connections.register(id).await;
        session.send(SessionCommand::Connected { id });
        session.send(SessionCommand::Join {
            id,
            name: name.to_string(),
        });
        TestClient { id, rx }
    }

    fn test_session(words: &str) -> (Arc<ConnectionManager>, SessionHandle) {
        let connections = Arc::new(ConnectionManager::new());
        let session = SessionCoordinator::spawn(
            SessionRules::default(),
            WordBank::new(words),
            connections.clone(),
            None,
        );
        (connections, session)
    }

    #[tokio::test]
    async fn join_flow_sends_catchup_then_announces() {
        let (connections, session) = test_session("apple");

        let mut alice = connect_and_join(&connections, &session, "Alice").await;
        assert!(matches!(
            alice.recv().await,
            ServerEvent::AllPlayers { players } if players.is_empty()
        ));
        assert!(matches!(
            alice.recv().await,
            ServerEvent::GameState { snapshot } if !snapshot.running
        ));
        assert!(matches!(
            alice.recv().await,
            ServerEvent::AllPlayers { players } if players.len() == 1
        ));

        let mut bob = connect_and_join(&connections, &session, "Bob").await;
        // Bob's catch-up roster already contains Alice
        assert!(matches!(
            bob.recv().await,
            ServerEvent::AllPlayers { players } if players.len() == 1
        ));
        // Alice hears about Bob
        assert!(matches!(
            alice.recv().await,
            ServerEvent::PlayerJoined { player } if player.name == "Bob"
        ));
    }

    #[tokio::test]
    async fn join_with_broken_score_store_seeds_zero() {
        // A reachable database with no schema: every lookup errors
        let db = sketch_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        let repo = Arc::new(ScoreRepository::new(db));

        let connections = Arc::new(ConnectionManager::new());
        let session = SessionCoordinator::spawn(
            SessionRules::default(),
            WordBank::new("apple"),
            connections.clone(),
            Some(repo),
        );

        let mut alice = connect_and_join(&connections, &session, "Alice").await;

        // Catch-up roster, snapshot, then the join's roster broadcast; the
        // failed lookup degrades to a zero seed instead of blocking the join
        let mut players = None;
        for _ in 0..3 {
            if let ServerEvent::AllPlayers { players: roster } = alice.recv().await {
                players = Some(roster);
            }
        }
        let players = players.expect("no roster broadcast seen");
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Alice");
        assert_eq!(players[0].score, 0.0);
    }

    #[tokio::test]
    async fn full_round_over_the_coordinator() {
        let (connections, session) = test_session("apple");

        let mut alice = connect_and_join(&connections, &session, "Alice").await;
        let mut bob = connect_and_join(&connections, &session, "Bob").await;
        session.send(SessionCommand::StartRound { id: alice.id });

        // Drawer sees the word, guesser sees the mask
        loop {
            match alice.recv().await {
                ServerEvent::WordReveal { word } => {
                    assert_eq!(word, "apple");
                    break;
                }
                _ => continue,
            }
        }
        loop {
            match bob.recv().await {
                ServerEvent::RoundStarted { masked_word } => {
                    assert_eq!(masked_word, "_____");
                    break;
                }
                _ => continue,
            }
        }

        // Wrong guess becomes chat for the others
        session.send(SessionCommand::Guess {
            id: bob.id,
            text: "pear".to_string(),
        });
        assert!(matches!(
            alice.recv().await,
            ServerEvent::ChatRelay { text, .. } if text == "pear"
        ));

        // Correct guess: private ack for Bob, redacted notice for Alice
        session.send(SessionCommand::Guess {
            id: bob.id,
            text: "Apple ".to_string(),
        });
        assert!(matches!(
            bob.recv().await,
            ServerEvent::GuessedCorrectly {
                guesser_score,
                drawer_score,
                ..
            } if guesser_score == 100.0 && drawer_score == 20.0
        ));
        assert!(matches!(
            alice.recv().await,
            ServerEvent::ChatRelay { text, .. } if !text.contains("apple")
        ));

        // Grace period end check ends the round
        loop {
            match bob.recv().await {
                ServerEvent::RoundStopped => break,
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn drawer_disconnect_stops_the_round() {
        let (connections, session) = test_session("apple");

        let mut alice = connect_and_join(&connections, &session, "Alice").await;
        let mut bob = connect_and_join(&connections, &session, "Bob").await;
        session.send(SessionCommand::StartRound { id: alice.id });

        // Let the start land, then drop the drawer
        loop {
            if let ServerEvent::RoundStarted { .. } = bob.recv().await {
                break;
            }
        }
        connections.remove(alice.id).await;
        session.send(SessionCommand::Disconnected { id: alice.id });

        loop {
            match bob.recv().await {
                ServerEvent::PlayerLeft { player_id } => {
                    assert_eq!(player_id, alice.id);
                    break;
                }
                _ => continue,
            }
        }
        assert!(matches!(bob.recv().await, ServerEvent::RoundStopped));
    }

    #[tokio::test]
    async fn drawing_frames_fan_out_to_other_players() {
        let (connections, session) = test_session("apple");

        let mut alice = connect_and_join(&connections, &session, "Alice").await;
        let mut bob = connect_and_join(&connections, &session, "Bob").await;

        session.send(SessionCommand::DrawingFrame {
            id: alice.id,
            data: "frame-1".to_string(),
        });
        session.send(SessionCommand::ClearCanvas { id: alice.id });

        // Skip past the join chatter; frame and clear arrive back to back
        loop {
            match bob.recv().await {
                ServerEvent::DrawingFrame { data } => {
                    assert_eq!(data, "frame-1");
                    break;
                }
                _ => continue,
            }
        }
        assert!(matches!(bob.recv().await, ServerEvent::CanvasCleared));

        // The sender never gets their own frames echoed back
        alice.assert_no_canvas_events();
    }

    #[tokio::test]
    async fn start_request_without_words_is_ignored() {
        let (connections, session) = test_session("");

        let mut alice = connect_and_join(&connections, &session, "Alice").await;
        session.send(SessionCommand::StartRound { id: alice.id });
        session.send(SessionCommand::Connected { id: alice.id });

        // The re-requested catch-up is processed after the start attempt,
        // and the session is still idle: the empty bank aborted it
        let mut last_snapshot = None;
        for _ in 0..5 {
            if let ServerEvent::GameState { snapshot } = alice.recv().await {
                last_snapshot = Some(snapshot);
            }
        }
        assert!(!last_snapshot.expect("no snapshot seen").running);
    }
}
