//! Progression core for the word quest game: persistence, economy
//! workflows, settings and the view-models driving the home and level
//! screens.

pub mod config;
pub mod home;
pub mod persistence;
pub mod rewards;
pub mod session;
pub mod settings;

pub use home::{CategoryCard, HomeState, HomeViewModel};
pub use session::{spawn_level_session, LevelEvent, LevelSessionHandle, LevelSnapshot};
