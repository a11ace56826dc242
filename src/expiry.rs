//! Room expiry scheduling
//!
//! One cancellable one-shot timer per room. Each timer is a spawned task
//! that sleeps for the room's time-to-live and then sends `ExpireRoom`
//! back into the server actor's command channel, so expiry is processed
//! in the same serialized context as client events.
//!
//! Cancellation aborts the sleeping task. If the task has already sent its
//! command, the actor's idempotent expire/delete path absorbs the race:
//! exactly one of {cancelled, fired-and-expired} is observed.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::server::ServerCommand;
use crate::types::RoomCode;

/// Per-room one-shot expiry timers, keyed by room code
///
/// Decoupled from `Room` itself so rooms and their timers have no
/// ownership cycle; the scheduler only knows codes and handles.
#[derive(Debug)]
pub struct ExpiryScheduler {
    cmd_tx: mpsc::Sender<ServerCommand>,
    timers: HashMap<RoomCode, JoinHandle<()>>,
}

impl ExpiryScheduler {
    /// Create a scheduler that delivers expiry into the given command channel
    pub fn new(cmd_tx: mpsc::Sender<ServerCommand>) -> Self {
        Self {
            cmd_tx,
            timers: HashMap::new(),
        }
    }

    /// Start the one-shot expiry timer for a room
    ///
    /// Called exactly once per room, at creation. A room's timer is never
    /// rescheduled; it is only ever cancelled by deletion.
    pub fn schedule(&mut self, code: RoomCode, ttl: Duration) {
        let cmd_tx = self.cmd_tx.clone();
        let timer_code = code.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // The actor may already be gone at shutdown; nothing to do then.
            let _ = cmd_tx
                .send(ServerCommand::ExpireRoom { room_code: timer_code })
                .await;
        });
        if let Some(stale) = self.timers.insert(code, handle) {
            stale.abort();
        }
    }

    /// Cancel a room's pending timer, if any
    ///
    /// No further effect once cancelled. Also used to drop the bookkeeping
    /// entry after a timer has fired (aborting a finished task is a no-op).
    pub fn cancel(&mut self, code: &RoomCode) -> bool {
        match self.timers.remove(code) {
            Some(handle) => {
                handle.abort();
                debug!("Cancelled expiry timer for room {}", code);
                true
            }
            None => false,
        }
    }

    /// Number of tracked timers
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_timer_fires_expire_command() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = ExpiryScheduler::new(tx);

        let code = RoomCode::from_string("TIMER1".into());
        scheduler.schedule(code.clone(), Duration::from_millis(20));

        let cmd = timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("timer did not fire")
            .expect("channel closed");
        match cmd {
            ServerCommand::ExpireRoom { room_code } => assert_eq!(room_code, code),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut scheduler = ExpiryScheduler::new(tx);

        let code = RoomCode::from_string("TIMER2".into());
        scheduler.schedule(code.clone(), Duration::from_millis(50));
        assert!(scheduler.cancel(&code));
        assert_eq!(scheduler.pending(), 0);

        // Past the original deadline, nothing must arrive.
        let outcome = timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(outcome.is_err(), "cancelled timer still fired");
    }

    #[tokio::test]
    async fn test_cancel_unknown_code_is_noop() {
        let (tx, _rx) = mpsc::channel(8);
        let mut scheduler = ExpiryScheduler::new(tx);

        assert!(!scheduler.cancel(&RoomCode::from_string("NONE00".into())));
    }
}
