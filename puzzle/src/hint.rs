//! Letter selection for paid hints.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Level, LevelGameState};
use crate::types::HintKind;

/// Tiles a hint may hide: not selected, not already removed, and carrying a
/// letter that does not occur in the answer.
pub fn removable_tiles(level: &Level, state: &LevelGameState) -> Vec<usize> {
    level
        .available_letters
        .iter()
        .enumerate()
        .filter(|(tile, _)| !state.is_used(*tile) && !state.is_removed(*tile))
        .filter(|(_, letter)| !level.answer_contains(**letter))
        .map(|(tile, _)| tile)
        .collect()
}

/// Pick the tiles a hint of `kind` removes. Returns fewer than the hint's
/// count when fewer incorrect tiles remain, sorted by tile index.
pub fn choose_tiles_to_remove<R: Rng + ?Sized>(
    level: &Level,
    state: &LevelGameState,
    kind: HintKind,
    rng: &mut R,
) -> Vec<usize> {
    let candidates = removable_tiles(level, state);
    let mut chosen: Vec<usize> = candidates
        .choose_multiple(rng, kind.letters_removed())
        .copied()
        .collect();
    chosen.sort_unstable();
    chosen
}
