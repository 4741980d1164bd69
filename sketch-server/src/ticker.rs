use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::coordinator::SessionCommand;

/// Drives a running round at a fixed one-second cadence by pushing `Tick`
/// commands into the session's inbound queue, so time shares the same
/// single-writer path as player events.
///
/// Dropping the ticker cancels the task. A tick already sitting in the
/// queue when the round ends carries a stale round number and is dropped
/// by the session.
pub struct RoundTicker {
    handle: JoinHandle<()>,
}

impl RoundTicker {
    pub fn spawn(commands: UnboundedSender<SessionCommand>, round: u64) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately; skip it so the
            // first reported second lands one second after round start.
            interval.tick().await;

            loop {
                interval.tick().await;
                if commands.send(SessionCommand::Tick { round }).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }
}

impl Drop for RoundTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One-shot delayed end check (the grace period after a correct guess).
/// Not cancellable on purpose: the session ignores it if the round it was
/// scheduled for is no longer the current one.
pub fn schedule_end_check(commands: UnboundedSender<SessionCommand>, round: u64, after: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = commands.send(SessionCommand::EndCheck { round });
    });
}
