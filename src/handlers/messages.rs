use crate::models::{Board, Coordinate, GameError, GameResult, OpponentEvent, TimerEvent};
use serde::{Deserialize, Serialize};

/// What a client may send over the websocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Submit { path: Vec<Coordinate> },
    OpponentScore { score: u32 },
    GameResult { result: GameResult },
}

impl ClientMessage {
    /// Opponent traffic, if this is any.
    pub fn into_opponent_event(self) -> Option<OpponentEvent> {
        match self {
            ClientMessage::OpponentScore { score } => Some(OpponentEvent::Score { score }),
            ClientMessage::GameResult { result } => Some(OpponentEvent::Result(result)),
            ClientMessage::Submit { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    MatchStarted {
        board: Board,
        starts_in_secs: u64,
        duration_secs: u64,
    },
    NoMatch,
    Accepted {
        word: String,
        score: u32,
        total: u32,
    },
    Rejected {
        error: GameError,
    },
    Timer {
        event: TimerEvent,
        /// The clock face, `m:ss`.
        display: String,
    },
    OpponentScore {
        score: u32,
    },
    Concluded {
        result: GameResult,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn timer(event: TimerEvent) -> Self {
        ServerMessage::Timer {
            display: event.display(),
            event,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"failed to encode reply: {}"}}"#, e)
        })
    }
}
