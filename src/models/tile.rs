use serde::{Deserialize, Serialize};

/// A single cell of the board: its letter and the modifiers that apply when
/// a word runs through it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub letter: char,
    pub base_value: u32,
    pub letter_multiplier: u32,
    pub word_multiplier: u32,
}

impl Tile {
    pub fn new(letter: char, base_value: u32) -> Self {
        Self {
            letter,
            base_value,
            letter_multiplier: 1,
            word_multiplier: 1,
        }
    }

    /// Plain tile using the classic value for its letter.
    pub fn plain(letter: char) -> Self {
        Self::new(letter, letter_value(letter))
    }

    // Clamped to at least 1.
    pub fn with_letter_multiplier(mut self, multiplier: u32) -> Self {
        self.letter_multiplier = multiplier.max(1);
        self
    }

    pub fn with_word_multiplier(mut self, multiplier: u32) -> Self {
        self.word_multiplier = multiplier.max(1);
        self
    }

    pub fn effective_value(&self) -> u32 {
        self.base_value.saturating_mul(self.letter_multiplier)
    }
}

/// Classic crossword-game letter values. Anything outside a-z is worth 1.
pub fn letter_value(letter: char) -> u32 {
    match letter.to_ascii_lowercase() {
        'a' | 'e' | 'i' | 'o' | 'u' | 'l' | 'n' | 'r' | 's' | 't' => 1,
        'd' | 'g' => 2,
        'b' | 'c' | 'm' | 'p' => 3,
        'f' | 'h' | 'v' | 'w' | 'y' => 4,
        'k' => 5,
        'j' | 'x' => 8,
        'q' | 'z' => 10,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_value_applies_letter_multiplier() {
        let tile = Tile::new('m', 3).with_letter_multiplier(2);
        assert_eq!(tile.effective_value(), 6);
        assert_eq!(Tile::plain('m').effective_value(), 3);
    }

    #[test]
    fn multipliers_never_drop_below_one() {
        let tile = Tile::plain('a')
            .with_letter_multiplier(0)
            .with_word_multiplier(0);
        assert_eq!(tile.letter_multiplier, 1);
        assert_eq!(tile.word_multiplier, 1);
    }

    #[test]
    fn letter_values() {
        assert_eq!(letter_value('e'), 1);
        assert_eq!(letter_value('Q'), 10);
        assert_eq!(letter_value('x'), 8);
        assert_eq!(letter_value('d'), 2);
        assert_eq!(letter_value('?'), 1);
    }

    #[test]
    fn structural_equality() {
        use std::collections::HashSet;

        let tiles: HashSet<Tile> = [Tile::plain('a'), Tile::plain('a'), Tile::plain('b')]
            .into_iter()
            .collect();
        assert_eq!(tiles.len(), 2);
        assert_ne!(Tile::plain('a'), Tile::plain('a').with_word_multiplier(2));
    }
}
