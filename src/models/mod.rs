mod board;
mod clock;
mod dictionary;
mod opponent;
mod path;
mod player;
mod scoring;
mod session;
mod tile;
mod timer;

pub use board::{Board, BoardError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dictionary::{DictionaryHandle, DictionaryIndex, LoadError};
pub use opponent::{GameResult, OpponentEvent, OpponentSync, OpponentView, PlayerHistory};
pub use path::{spell, validate, Coordinate, PathError};
pub use player::{PlayerId, WordEntry};
pub use scoring::score;
pub use session::{GameError, MatchSession, SessionError};
pub use tile::{letter_value, Tile};
pub use timer::{Timer, TimerEvent};
