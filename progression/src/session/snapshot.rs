use puzzle::AttemptPhase;

use crate::persistence::LevelCompletion;

/// Complete, immutable snapshot of a level session.
/// Sent to subscribers on every state change and on subscribe.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub session_id: String,
    pub level_id: i64,
    pub category_id: i64,
    pub level_number: u32,
    pub question: String,
    pub image: Option<String>,
    pub answer_length: u32,
    pub tiles: Vec<TileView>,
    pub player_answer: String,
    pub phase: AttemptPhase,
    pub is_paused: bool,
    pub current_lives: u32,
    pub max_lives: u32,
    pub hints_used: u32,
    pub hint_cost: i64,
    /// Stars the level would award if solved now, or the awarded stars once solved.
    pub stars: u32,
    pub elapsed_secs: i64,
    pub next_life_in_secs: Option<i64>,
    pub completion: Option<LevelCompletion>,
    pub info_message: Option<String>,
    pub error_message: Option<String>,
}

/// One letter tile as the player sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileView {
    pub index: usize,
    pub letter: char,
    pub selected: bool,
    pub removed: bool,
}

impl LevelSnapshot {
    pub fn is_solved(&self) -> bool {
        self.phase == AttemptPhase::Solved
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == AttemptPhase::GameOver
    }

    /// Tiles that can still be picked.
    pub fn selectable(&self) -> impl Iterator<Item = &TileView> {
        self.tiles.iter().filter(|t| !t.selected && !t.removed)
    }
}
