use crate::models::{Board, Tile};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// True for the eight cells surrounding `self`; a cell is not adjacent to itself.
    pub fn is_adjacent(&self, other: &Coordinate) -> bool {
        let d_row = (self.row - other.row).abs();
        let d_col = (self.col - other.col).abs();
        d_row <= 1 && d_col <= 1 && (d_row, d_col) != (0, 0)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    EmptyPath,
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coordinate),
    #[error("path visits the same cell more than once")]
    DuplicateCoordinates,
    #[error("path jumps between cells that are not adjacent")]
    NotContinuousPath,
}

/// Check a dragged selection against the board and return the tiles it
/// covers, in path order.
///
/// Checks run in a fixed order and stop at the first failure: empty path,
/// bounds, repeated cells, then adjacency of each consecutive pair.
pub fn validate(path: &[Coordinate], board: &Board) -> Result<Vec<Tile>, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let mut tiles = Vec::with_capacity(path.len());
    for &coordinate in path {
        match board.get(coordinate) {
            Some(tile) => tiles.push(*tile),
            None => return Err(PathError::OutOfBounds(coordinate)),
        }
    }

    let mut seen = HashSet::with_capacity(path.len());
    if !path.iter().all(|coordinate| seen.insert(*coordinate)) {
        return Err(PathError::DuplicateCoordinates);
    }

    if path.windows(2).any(|pair| !pair[0].is_adjacent(&pair[1])) {
        return Err(PathError::NotContinuousPath);
    }

    Ok(tiles)
}

/// Lower-cased word spelled by `tiles` in order.
pub fn spell(tiles: &[Tile]) -> String {
    tiles
        .iter()
        .map(|tile| tile.letter)
        .collect::<String>()
        .to_lowercase()
}
