//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! Enum columns are stored as their canonical `TEXT` names; ordered sequences
//! (tile pools, selected and removed tiles) as JSON arrays.

use puzzle::{CategoryType, RewardType};

use crate::persistence::PersistenceError;

// ── CategoryType ───────────────────────────────────────────────────────

pub fn encode_category_type(t: CategoryType) -> &'static str {
    t.as_str()
}

pub fn decode_category_type(s: &str) -> Result<CategoryType, PersistenceError> {
    CategoryType::parse(s)
        .ok_or_else(|| PersistenceError::InvalidData(format!("unknown category type '{s}'")))
}

// ── RewardType ─────────────────────────────────────────────────────────

pub fn encode_reward_type(t: RewardType) -> &'static str {
    t.as_str()
}

pub fn decode_reward_type(s: &str) -> Result<RewardType, PersistenceError> {
    RewardType::parse(s)
        .ok_or_else(|| PersistenceError::InvalidData(format!("unknown reward type '{s}'")))
}

// ── JSON sequences ─────────────────────────────────────────────────────

pub fn encode_letters(letters: &[char]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(letters)?)
}

pub fn decode_letters(json: &str) -> Result<Vec<char>, PersistenceError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_tiles(tiles: &[usize]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(tiles)?)
}

pub fn decode_tiles(json: &str) -> Result<Vec<usize>, PersistenceError> {
    Ok(serde_json::from_str(json)?)
}

/// Narrow a stored integer into a `u32` count, rejecting negatives.
pub fn to_u32(value: i64, column: &str) -> Result<u32, PersistenceError> {
    u32::try_from(value)
        .map_err(|_| PersistenceError::InvalidData(format!("{column} out of range: {value}")))
}
