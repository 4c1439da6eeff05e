use super::snapshot::LevelSnapshot;

/// Events broadcast from the level session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum LevelEvent {
    /// Full state snapshot after any mutation.
    StateChanged(LevelSnapshot),
    /// The level was solved and its rewards credited.
    Completed(LevelSnapshot),
    /// A storage failure, already reflected in the snapshot's error message.
    Error(String),
}
