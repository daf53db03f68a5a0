use crate::models::Tile;

/// Points for a word laid along `tiles`, which must already be a validated path.
///
/// Letter values are summed first, then every word multiplier above 1 met
/// along the path is applied in turn, so two double-word tiles quadruple the
/// sum rather than doubling it.
pub fn score(tiles: &[Tile]) -> u32 {
    let total = tiles
        .iter()
        .map(Tile::effective_value)
        .fold(0u32, u32::saturating_add);

    let word_multipliers: Vec<u32> = tiles
        .iter()
        .map(|tile| tile.word_multiplier)
        .filter(|&multiplier| multiplier > 1)
        .collect();

    word_multipliers
        .into_iter()
        .fold(total, u32::saturating_mul)
}
