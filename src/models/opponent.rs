use crate::models::{PlayerId, WordEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHistory {
    pub player: PlayerId,
    pub words: Vec<WordEntry>,
}

/// Final word from the match server: who won and what each side played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// `None` for a draw.
    pub winner: Option<PlayerId>,
    pub histories: Vec<PlayerHistory>,
}

impl GameResult {
    pub fn history_of(&self, player: &PlayerId) -> Option<&PlayerHistory> {
        self.histories.iter().find(|history| &history.player == player)
    }

    pub fn total_for(&self, player: &PlayerId) -> u32 {
        self.history_of(player)
            .map(|history| history.words.iter().map(|entry| entry.score).sum())
            .unwrap_or(0)
    }
}

/// Inbound traffic from the transport, already deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpponentEvent {
    /// The opponent's running total.
    Score { score: u32 },
    Result(GameResult),
}

type SharedResult = Option<Arc<GameResult>>;

/// Writer half: the only thing allowed to change what a session shows for
/// the opponent. It never sees the local score or word set.
#[derive(Debug, Clone)]
pub struct OpponentSync {
    score: Arc<watch::Sender<u32>>,
    result: Arc<watch::Sender<SharedResult>>,
}

/// Reader half, held by the session for display.
#[derive(Debug, Clone)]
pub struct OpponentView {
    score: watch::Receiver<u32>,
    result: watch::Receiver<SharedResult>,
}

pub fn channel() -> (OpponentSync, OpponentView) {
    let (score_tx, score_rx) = watch::channel(0);
    let (result_tx, result_rx) = watch::channel(None);
    (
        OpponentSync {
            score: Arc::new(score_tx),
            result: Arc::new(result_tx),
        },
        OpponentView {
            score: score_rx,
            result: result_rx,
        },
    )
}

impl OpponentSync {
    /// Record the opponent's latest total. Totals lower than the one shown
    /// arrived out of order and are dropped, as is anything after the final
    /// result. Returns whether the displayed score changed.
    pub fn update_score(&self, score: u32) -> bool {
        if self.result.borrow().is_some() {
            return false;
        }

        let changed = self.score.send_if_modified(|current| {
            if score > *current {
                *current = score;
                true
            } else {
                false
            }
        });
        if changed {
            debug!("Opponent score now {}", score);
        }
        changed
    }

    /// Ingest the authoritative result. Only the first one counts.
    pub fn conclude(&self, result: GameResult) -> bool {
        let winner = result.winner.clone();
        let concluded = self.result.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(Arc::new(result));
            true
        });
        if concluded {
            match winner {
                Some(winner) => info!("Match concluded, winner {}", winner),
                None => info!("Match concluded in a draw"),
            }
        }
        concluded
    }

    pub fn apply(&self, event: OpponentEvent) -> bool {
        match event {
            OpponentEvent::Score { score } => self.update_score(score),
            OpponentEvent::Result(result) => self.conclude(result),
        }
    }

    /// Follow display changes, for pushing them on to a UI.
    pub fn watch_score(&self) -> watch::Receiver<u32> {
        self.score.subscribe()
    }

    pub fn watch_result(&self) -> watch::Receiver<SharedResult> {
        self.result.subscribe()
    }

    /// Drain transport events until the channel closes, the final result
    /// arrives, or `cancel` is notified.
    pub async fn run(self, mut events: mpsc::Receiver<OpponentEvent>, cancel: Arc<Notify>) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let terminal = matches!(event, OpponentEvent::Result(_));
                        self.apply(event);
                        if terminal {
                            break;
                        }
                    }
                    None => break,
                },
                _ = cancel.notified() => {
                    debug!("Opponent feed cancelled");
                    break;
                }
            }
        }
    }
}

impl OpponentView {
    pub fn score(&self) -> u32 {
        *self.score.borrow()
    }

    pub fn result(&self) -> SharedResult {
        self.result.borrow().clone()
    }

    pub fn is_concluded(&self) -> bool {
        self.result.borrow().is_some()
    }
}
