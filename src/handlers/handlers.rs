use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, mpsc, watch, Mutex, Notify};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::handlers::{ServerMessage, WebSockets};
use crate::models::{
    Board, BoardError, Clock, Coordinate, DictionaryHandle, GameResult, MatchSession,
    OpponentEvent, SystemClock, Timer, TimerEvent,
};

// Opponent events queued from the transport before back-pressure kicks in
const OPPONENT_QUEUE: usize = 32;

struct LiveMatch {
    session: MatchSession,
    timer: Timer,
    opponent_tx: mpsc::Sender<OpponentEvent>,
    opponent_cancel: Arc<Notify>,
}

impl LiveMatch {
    fn in_progress(&self) -> bool {
        !self.session.remaining().is_zero() && !self.session.is_concluded()
    }

    fn started_message(&self) -> ServerMessage {
        let now = SystemClock.now();
        ServerMessage::MatchStarted {
            board: self.session.board().clone(),
            starts_in_secs: self
                .session
                .start()
                .duration_since(now)
                .unwrap_or(Duration::ZERO)
                .as_secs(),
            duration_secs: self
                .session
                .end()
                .duration_since(self.session.start())
                .unwrap_or(Duration::ZERO)
                .as_secs(),
        }
    }

    fn shut_down(&self) {
        self.timer.cancel();
        self.opponent_cancel.notify_one();
    }
}

/// Server side of the transport: the match currently being played and the
/// channels its updates fan out on.
pub struct AppState {
    config: Config,
    dictionary: DictionaryHandle,
    current: Mutex<Option<LiveMatch>>,
    pub tx: broadcast::Sender<ServerMessage>,
    timer_tx: broadcast::Sender<TimerEvent>,
}

impl AppState {
    pub fn new(config: Config, dictionary: DictionaryHandle) -> Arc<Self> {
        let (tx, _) = broadcast::channel(16);
        let (timer_tx, _) = broadcast::channel(4);
        Arc::new(Self {
            config,
            dictionary,
            current: Mutex::new(None),
            tx,
            timer_tx,
        })
    }

    pub fn subscribe(
        &self,
    ) -> (
        broadcast::Receiver<ServerMessage>,
        broadcast::Receiver<TimerEvent>,
    ) {
        (self.tx.subscribe(), self.timer_tx.subscribe())
    }

    /// Roll a board and open a new match. Does nothing while one is still
    /// running; returns whether a match was started.
    pub async fn start_match(&self) -> bool {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(LiveMatch::in_progress) {
            return false;
        }

        let board = match self.roll_board() {
            Ok(board) => Arc::new(board),
            Err(e) => {
                error!("Failed to roll a board: {}", e);
                return false;
            }
        };

        let start = SystemClock.now() + self.config.start_delay;
        let end = start + self.config.match_duration;
        let session = match MatchSession::new(
            start,
            end,
            board,
            self.dictionary.clone(),
            SystemClock,
        ) {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to open a match: {}", e);
                return false;
            }
        };
        if !self.dictionary.is_ready() {
            warn!("Starting a match before the word list has loaded");
        }

        if let Some(previous) = current.take() {
            previous.shut_down();
        }

        let timer = Timer::new(self.timer_tx.clone());
        timer.start(SystemClock, start, end);

        let (opponent_tx, opponent_rx) = mpsc::channel(OPPONENT_QUEUE);
        let opponent_cancel = Arc::new(Notify::new());
        let sync = session.opponent_sync();
        Self::spawn_opponent_relay(sync.watch_score(), sync.watch_result(), self.tx.clone());
        tokio::spawn(sync.run(opponent_rx, Arc::clone(&opponent_cancel)));

        let live = LiveMatch {
            session,
            timer,
            opponent_tx,
            opponent_cancel,
        };
        self.broadcast(live.started_message());
        info!(
            "Match started on a {}x{} board, {}s long",
            self.config.board_rows,
            self.config.board_cols,
            self.config.match_duration.as_secs()
        );
        *current = Some(live);
        true
    }

    fn roll_board(&self) -> Result<Board, BoardError> {
        let mut rng = rand::thread_rng();
        Board::random(self.config.board_rows, self.config.board_cols, &mut rng)
    }

    pub async fn snapshot(&self) -> ServerMessage {
        match self.current.lock().await.as_ref() {
            Some(live) => live.started_message(),
            None => ServerMessage::NoMatch,
        }
    }

    pub async fn submit(&self, path: &[Coordinate]) -> ServerMessage {
        let mut current = self.current.lock().await;
        let Some(live) = current.as_mut() else {
            return ServerMessage::NoMatch;
        };

        match live.session.submit_word(path) {
            Ok(score) => ServerMessage::Accepted {
                word: live
                    .session
                    .history()
                    .last()
                    .map(|entry| entry.word.clone())
                    .unwrap_or_default(),
                score,
                total: live.session.local_score(),
            },
            Err(error) => ServerMessage::Rejected { error },
        }
    }

    /// Hand opponent traffic to the running match's adapter. Returns a reply
    /// only when there is nothing to hand it to.
    pub async fn opponent_event(&self, event: OpponentEvent) -> Option<ServerMessage> {
        let opponent_tx = match self.current.lock().await.as_ref() {
            Some(live) => live.opponent_tx.clone(),
            None => return Some(ServerMessage::NoMatch),
        };

        if opponent_tx.send(event).await.is_err() {
            warn!("Opponent feed closed, dropping event");
        }
        None
    }

    fn spawn_opponent_relay(
        mut score: watch::Receiver<u32>,
        mut result: watch::Receiver<Option<Arc<GameResult>>>,
        tx: broadcast::Sender<ServerMessage>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = score.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let total = *score.borrow_and_update();
                        let _ = tx.send(ServerMessage::OpponentScore { score: total });
                    },
                    changed = result.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let concluded = result.borrow_and_update().clone();
                        if let Some(concluded) = concluded {
                            let _ = tx.send(ServerMessage::Concluded {
                                result: GameResult::clone(&concluded),
                            });
                            break;
                        }
                    },
                }
            }
        });
    }

    fn broadcast(&self, message: ServerMessage) {
        if let Err(e) = self.tx.send(message) {
            // Nobody connected yet
            debug!("No one to broadcast to: {}", e);
        }
    }
}

pub struct Handle {}

impl Handle {
    pub async fn new_match(State(state): State<Arc<AppState>>) -> impl IntoResponse {
        if state.start_match().await {
            StatusCode::CREATED
        } else {
            StatusCode::NO_CONTENT
        }
    }

    pub async fn websocket(
        ws: WebSocketUpgrade,
        State(state): State<Arc<AppState>>,
    ) -> impl IntoResponse {
        ws.on_upgrade(|socket| async move { WebSockets::new(socket, state).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DictionaryIndex, GameError};

    fn state(start_delay: Duration) -> Arc<AppState> {
        let config = Config {
            start_delay,
            ..Config::default()
        };
        let dictionary = DictionaryIndex::from_bytes(b"a\ne\ni\no\nu\n".to_vec()).into();
        AppState::new(config, dictionary)
    }

    #[tokio::test]
    async fn no_match_until_started() {
        let state = state(Duration::ZERO);
        assert_eq!(state.snapshot().await, ServerMessage::NoMatch);
        assert_eq!(
            state.submit(&[Coordinate::new(0, 0)]).await,
            ServerMessage::NoMatch
        );
        assert_eq!(
            state.opponent_event(OpponentEvent::Score { score: 1 }).await,
            Some(ServerMessage::NoMatch)
        );
    }

    #[tokio::test]
    async fn start_broadcasts_board_and_refuses_to_restart() {
        let state = state(Duration::ZERO);
        let (mut messages, _) = state.subscribe();

        assert!(state.start_match().await);
        match messages.recv().await.unwrap() {
            ServerMessage::MatchStarted {
                board,
                duration_secs,
                ..
            } => {
                assert_eq!((board.rows(), board.cols()), (4, 4));
                assert_eq!(duration_secs, 120);
            }
            other => panic!("unexpected message {:?}", other),
        }

        assert!(!state.start_match().await);
    }

    #[tokio::test]
    async fn submissions_before_start_are_rejected() {
        let state = state(Duration::from_secs(60));
        assert!(state.start_match().await);
        assert_eq!(
            state.submit(&[Coordinate::new(0, 0)]).await,
            ServerMessage::Rejected {
                error: GameError::GameIsNotActive
            }
        );
    }

    #[tokio::test]
    async fn opponent_score_is_relayed() {
        let state = state(Duration::ZERO);
        assert!(state.start_match().await);
        let (mut messages, _) = state.subscribe();

        assert_eq!(
            state.opponent_event(OpponentEvent::Score { score: 8 }).await,
            None
        );
        assert_eq!(
            messages.recv().await.unwrap(),
            ServerMessage::OpponentScore { score: 8 }
        );
    }
}
