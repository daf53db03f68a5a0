use crate::models::{tile::letter_value, Coordinate, Tile};
use rand::{
    seq::{index, SliceRandom},
    Rng,
};
use serde::Serialize;
use thiserror::Error;

// Classic letter dice, one per cell of a 4x4 board
const DICE: [&str; 16] = [
    "AAEEGN", "ELRTTY", "AOOTTW", "ABBJOO", "EHRTVW", "CIMOTU", "DISTTY", "EIOSST", "DELRVY",
    "ACHOPS", "HIMNQU", "EEINSU", "EEGHNW", "AFFKPS", "HLNNRZ", "DEILRX",
];

// (letter multiplier, word multiplier) for each premium square placed on a random board
const PREMIUMS: [(u32, u32); 4] = [(2, 1), (3, 1), (1, 2), (1, 3)];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have at least one row and one column")]
    Empty,
    #[error("expected {expected} tiles for the board, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Fixed `rows x cols` grid of tiles, stored row-major. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn new(rows: usize, cols: usize, tiles: Vec<Tile>) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::Empty);
        }
        if tiles.len() != rows * cols {
            return Err(BoardError::SizeMismatch {
                expected: rows * cols,
                actual: tiles.len(),
            });
        }
        Ok(Self { rows, cols, tiles })
    }

    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, BoardError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let row_count = rows.len();
        let mut tiles = Vec::with_capacity(row_count * cols);

        for (row, row_tiles) in rows.into_iter().enumerate() {
            if row_tiles.len() != cols {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: cols,
                    actual: row_tiles.len(),
                });
            }
            tiles.extend(row_tiles);
        }

        Self::new(row_count, cols, tiles)
    }

    /// Roll a fresh board. Every cell gets a die face; a handful of cells get
    /// letter or word premiums.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::Empty);
        }

        let cell_count = rows * cols;
        let mut tiles = Vec::with_capacity(cell_count);

        // Boards bigger than the dice set reuse the set, reshuffled each pass
        while tiles.len() < cell_count {
            let mut dice = DICE;
            dice.shuffle(rng);

            for die in dice.iter().take(cell_count - tiles.len()) {
                let faces = die.as_bytes();
                let face = faces[rng.gen_range(0..faces.len())] as char;
                let letter = face.to_ascii_lowercase();
                tiles.push(Tile::new(letter, letter_value(letter)));
            }
        }

        let premium_count = PREMIUMS.len().min(cell_count);
        let premium_cells = index::sample(rng, cell_count, premium_count);
        for (cell, &(letter_multiplier, word_multiplier)) in
            premium_cells.into_iter().zip(PREMIUMS.iter())
        {
            tiles[cell] = tiles[cell]
                .with_letter_multiplier(letter_multiplier)
                .with_word_multiplier(word_multiplier);
        }

        Self::new(rows, cols, tiles)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.row >= 0
            && coordinate.col >= 0
            && (coordinate.row as usize) < self.rows
            && (coordinate.col as usize) < self.cols
    }

    pub fn get(&self, coordinate: Coordinate) -> Option<&Tile> {
        if !self.contains(coordinate) {
            return None;
        }
        self.tiles
            .get(coordinate.row as usize * self.cols + coordinate.col as usize)
    }

    pub fn row(&self, row: usize) -> Option<&[Tile]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.tiles[row * self.cols..(row + 1) * self.cols])
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn small_board() -> Board {
        Board::from_rows(vec![
            vec![Tile::plain('a'), Tile::plain('b')],
            vec![Tile::plain('c'), Tile::plain('d')],
            vec![Tile::plain('e'), Tile::plain('f')],
        ])
        .unwrap()
    }

    #[test]
    fn get_resolves_every_cell_in_bounds() {
        let board = small_board();
        assert_eq!(board.rows(), 3);
        assert_eq!(board.cols(), 2);
        assert_eq!(board.get(Coordinate::new(0, 0)).unwrap().letter, 'a');
        assert_eq!(board.get(Coordinate::new(1, 1)).unwrap().letter, 'd');
        assert_eq!(board.get(Coordinate::new(2, 0)).unwrap().letter, 'e');
        assert_eq!(board.row(2).unwrap().len(), 2);
    }

    #[test]
    fn get_rejects_out_of_bounds() {
        let board = small_board();
        assert!(board.get(Coordinate::new(3, 0)).is_none());
        assert!(board.get(Coordinate::new(0, 2)).is_none());
        assert!(board.get(Coordinate::new(-1, 0)).is_none());
        assert!(board.get(Coordinate::new(0, -1)).is_none());
        assert!(board.row(3).is_none());
    }

    #[test]
    fn construction_errors() {
        assert_eq!(Board::new(0, 4, vec![]), Err(BoardError::Empty));
        assert_eq!(
            Board::new(2, 2, vec![Tile::plain('a')]),
            Err(BoardError::SizeMismatch {
                expected: 4,
                actual: 1
            })
        );
        assert_eq!(
            Board::from_rows(vec![vec![Tile::plain('a')], vec![]]),
            Err(BoardError::RaggedRow {
                row: 1,
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(Board::from_rows(vec![]), Err(BoardError::Empty));
    }

    #[test]
    fn random_board_has_requested_shape_and_premiums() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::random(4, 4, &mut rng).unwrap();

        assert_eq!(board.tiles().len(), 16);
        assert!(board.tiles().iter().all(|t| t.letter.is_ascii_lowercase()));
        assert!(board
            .tiles()
            .iter()
            .all(|t| t.base_value == letter_value(t.letter)));

        let letter_premiums = board
            .tiles()
            .iter()
            .filter(|t| t.letter_multiplier > 1)
            .count();
        let word_premiums = board
            .tiles()
            .iter()
            .filter(|t| t.word_multiplier > 1)
            .count();
        assert_eq!(letter_premiums, 2);
        assert_eq!(word_premiums, 2);
    }

    #[test]
    fn random_board_larger_than_dice_set() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = Board::random(5, 6, &mut rng).unwrap();
        assert_eq!(board.tiles().len(), 30);

        let tiny = Board::random(1, 2, &mut rng).unwrap();
        let premiums = tiny
            .tiles()
            .iter()
            .filter(|t| t.letter_multiplier > 1 || t.word_multiplier > 1)
            .count();
        assert_eq!(premiums, 2);
    }

    #[test]
    fn random_board_is_reproducible_from_seed() {
        let a = Board::random(4, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = Board::random(4, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
