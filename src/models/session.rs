use crate::models::{
    opponent, path, scoring, Board, Clock, Coordinate, DictionaryHandle, GameResult,
    OpponentSync, OpponentView, PathError, SystemClock, WordEntry,
};
use serde::Serialize;
use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, SystemTime},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

// Accepted words waiting for a slow subscriber before the oldest are dropped
const ACCEPTED_CHANNEL_CAPACITY: usize = 64;

/// Why a submission was turned down. None of these end the match; the same
/// call with the same inputs always fails the same way.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameError {
    #[error("the match is not active")]
    GameIsNotActive,
    #[error("path is empty")]
    EmptyPath,
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coordinate),
    #[error("path visits the same cell more than once")]
    DuplicateCoordinates,
    #[error("path jumps between cells that are not adjacent")]
    NotContinuousPath,
    #[error("word was already found this match")]
    WordAlreadyFound,
    #[error("word is not in the word list")]
    WordNotInList,
}

impl From<PathError> for GameError {
    fn from(error: PathError) -> Self {
        match error {
            PathError::EmptyPath => GameError::EmptyPath,
            PathError::OutOfBounds(coordinate) => GameError::OutOfBounds(coordinate),
            PathError::DuplicateCoordinates => GameError::DuplicateCoordinates,
            PathError::NotContinuousPath => GameError::NotContinuousPath,
        }
    }
}

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("match must end after it starts")]
    InvalidWindow,
}

/// One player's side of a timed match.
///
/// The session is active from `start` to `end` inclusive, judged against its
/// clock on every call. Outside that window, or after a forfeit, nothing can
/// change it, though every score and word stays readable.
#[derive(Debug)]
pub struct MatchSession<C: Clock = SystemClock> {
    start: SystemTime,
    end: SystemTime,
    board: Arc<Board>,
    dictionary: DictionaryHandle,
    words_found: HashSet<String>,
    history: Vec<WordEntry>,
    local_score: u32,
    forfeited: bool,
    opponent: OpponentView,
    opponent_sync: OpponentSync,
    accepted_tx: broadcast::Sender<WordEntry>,
    clock: C,
}

impl<C: Clock> MatchSession<C> {
    pub fn new(
        start: SystemTime,
        end: SystemTime,
        board: Arc<Board>,
        dictionary: DictionaryHandle,
        clock: C,
    ) -> Result<Self, SessionError> {
        if end <= start {
            return Err(SessionError::InvalidWindow);
        }

        let (opponent_sync, opponent) = opponent::channel();
        let (accepted_tx, _) = broadcast::channel(ACCEPTED_CHANNEL_CAPACITY);

        Ok(Self {
            start,
            end,
            board,
            dictionary,
            words_found: HashSet::new(),
            history: Vec::new(),
            local_score: 0,
            forfeited: false,
            opponent,
            opponent_sync,
            accepted_tx,
            clock,
        })
    }

    pub fn is_game_active(&self) -> bool {
        let now = self.clock.now();
        !self.forfeited && now >= self.start && now <= self.end
    }

    /// Score the word dragged along `path` and bank it.
    ///
    /// Checks run cheapest first: the match window, then the path itself,
    /// then whether the word was already banked, and only then the
    /// dictionary.
    pub fn submit_word(&mut self, path: &[Coordinate]) -> Result<u32, GameError> {
        if !self.is_game_active() {
            return Err(GameError::GameIsNotActive);
        }

        let tiles = path::validate(path, &self.board).map_err(|e| {
            debug!("Rejected path {:?}: {}", path, e);
            GameError::from(e)
        })?;
        let word = path::spell(&tiles);

        if self.words_found.contains(&word) {
            debug!("Rejected {}: already found", word);
            return Err(GameError::WordAlreadyFound);
        }

        if !self.dictionary.contains(&word) {
            debug!("Rejected {}: not in word list", word);
            return Err(GameError::WordNotInList);
        }

        let points = scoring::score(&tiles);
        self.local_score = self.local_score.saturating_add(points);
        self.words_found.insert(word.clone());

        let entry = WordEntry {
            word,
            path: path.to_vec(),
            elapsed_ms: self.elapsed().as_millis() as u64,
            score: points,
        };
        debug!(
            "Accepted {} for {} points, total {}",
            entry.word, points, self.local_score
        );
        // Nobody listening is fine; the history keeps the entry regardless
        let _ = self.accepted_tx.send(entry.clone());
        self.history.push(entry);

        Ok(points)
    }

    /// End the match early. The session stays inactive from here on.
    pub fn forfeit(&mut self) {
        if !self.forfeited {
            info!("Match forfeited with {} points", self.local_score);
            self.forfeited = true;
        }
    }

    pub fn is_forfeited(&self) -> bool {
        self.forfeited
    }

    /// Time until the window closes; zero once it has or after a forfeit.
    pub fn remaining(&self) -> Duration {
        if self.forfeited {
            return Duration::ZERO;
        }
        self.end
            .duration_since(self.clock.now())
            .unwrap_or(Duration::ZERO)
    }

    fn elapsed(&self) -> Duration {
        self.clock
            .now()
            .duration_since(self.start)
            .unwrap_or(Duration::ZERO)
    }

    pub fn local_score(&self) -> u32 {
        self.local_score
    }

    pub fn opponent_score(&self) -> u32 {
        self.opponent.score()
    }

    /// The server's result, once it has arrived. Local submissions after this
    /// still count locally but no longer matter for the outcome.
    pub fn authoritative_result(&self) -> Option<Arc<GameResult>> {
        self.opponent.result()
    }

    pub fn is_concluded(&self) -> bool {
        self.opponent.is_concluded()
    }

    /// The adapter that feeds this session's opponent display.
    pub fn opponent_sync(&self) -> OpponentSync {
        self.opponent_sync.clone()
    }

    /// Accepted words as they happen, for the transport to send on.
    pub fn subscribe(&self) -> broadcast::Receiver<WordEntry> {
        self.accepted_tx.subscribe()
    }

    pub fn words_found(&self) -> &HashSet<String> {
        &self.words_found
    }

    pub fn history(&self) -> &[WordEntry] {
        &self.history
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn start(&self) -> SystemTime {
        self.start
    }

    pub fn end(&self) -> SystemTime {
        self.end
    }
}
