//! Lives regeneration over wall-clock time.
//!
//! Two models are supported:
//! - [`RegenerationMode::FullRefill`]: the timer starts when lives hit zero and
//!   restores every life once it elapses. No timer runs otherwise.
//! - [`RegenerationMode::PerLife`]: the timer starts on the first lost life and
//!   restores one life per interval until lives are back at maximum.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REGEN_SECS: i64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RegenerationMode {
    #[default]
    FullRefill,
    PerLife,
}

impl RegenerationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "full" | "full_refill" | "fullrefill" => Some(Self::FullRefill),
            "per_life" | "perlife" | "life" => Some(Self::PerLife),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivesPolicy {
    pub mode: RegenerationMode,
    pub interval_secs: i64,
}

impl Default for LivesPolicy {
    fn default() -> Self {
        Self {
            mode: RegenerationMode::FullRefill,
            interval_secs: DEFAULT_REGEN_SECS,
        }
    }
}

/// Lives and timer anchor after applying elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivesRecovery {
    pub lives: u32,
    pub timer_started_at: Option<i64>,
}

impl LivesPolicy {
    fn interval_ms(&self) -> i64 {
        self.interval_secs.max(1) * 1000
    }

    /// Timer anchor after a life was lost and `lives_after` remain.
    pub fn on_life_lost(&self, lives_after: u32, max: u32, anchor: Option<i64>, now: i64) -> Option<i64> {
        match self.mode {
            RegenerationMode::FullRefill if lives_after == 0 => anchor.or(Some(now)),
            RegenerationMode::FullRefill => anchor,
            RegenerationMode::PerLife if lives_after < max => anchor.or(Some(now)),
            RegenerationMode::PerLife => None,
        }
    }

    /// Apply the time elapsed since `anchor` to `lives`.
    pub fn regenerate(&self, lives: u32, max: u32, anchor: Option<i64>, now: i64) -> LivesRecovery {
        let Some(started) = anchor else {
            return LivesRecovery {
                lives,
                timer_started_at: None,
            };
        };
        if lives >= max {
            return LivesRecovery {
                lives: max,
                timer_started_at: None,
            };
        }

        let elapsed = (now - started).max(0);
        let intervals = elapsed / self.interval_ms();
        if intervals == 0 {
            return LivesRecovery {
                lives,
                timer_started_at: anchor,
            };
        }

        match self.mode {
            RegenerationMode::FullRefill => LivesRecovery {
                lives: max,
                timer_started_at: None,
            },
            RegenerationMode::PerLife => {
                let gained = intervals.min((max - lives) as i64) as u32;
                let lives = lives + gained;
                let timer_started_at = if lives >= max {
                    None
                } else {
                    Some(started + gained as i64 * self.interval_ms())
                };
                LivesRecovery {
                    lives,
                    timer_started_at,
                }
            }
        }
    }

    /// Seconds until the next regeneration step, if a timer is running.
    pub fn remaining_secs(&self, anchor: Option<i64>, now: i64) -> Option<i64> {
        let started = anchor?;
        let due = started + self.interval_ms();
        Some(((due - now).max(0) + 999) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    #[test]
    fn full_refill_only_starts_at_zero() {
        let policy = LivesPolicy::default();
        assert_eq!(policy.on_life_lost(2, 3, None, 0), None);
        assert_eq!(policy.on_life_lost(0, 3, None, 500), Some(500));
    }

    #[test]
    fn full_refill_restores_everything_after_interval() {
        let policy = LivesPolicy::default();
        let before = policy.regenerate(0, 3, Some(0), 29 * MIN);
        assert_eq!(before.lives, 0);
        assert_eq!(before.timer_started_at, Some(0));

        let after = policy.regenerate(0, 3, Some(0), 30 * MIN);
        assert_eq!(
            after,
            LivesRecovery {
                lives: 3,
                timer_started_at: None
            }
        );
    }

    #[test]
    fn per_life_adds_one_per_interval() {
        let policy = LivesPolicy {
            mode: RegenerationMode::PerLife,
            interval_secs: 600,
        };
        assert_eq!(policy.on_life_lost(2, 3, None, 0), Some(0));

        let one = policy.regenerate(0, 3, Some(0), 15 * MIN);
        assert_eq!(one.lives, 1);
        assert_eq!(one.timer_started_at, Some(10 * MIN));

        let full = policy.regenerate(0, 3, Some(0), 90 * MIN);
        assert_eq!(full.lives, 3);
        assert_eq!(full.timer_started_at, None);
    }

    #[test]
    fn no_timer_means_no_change() {
        let policy = LivesPolicy::default();
        let r = policy.regenerate(1, 3, None, 100 * MIN);
        assert_eq!(r.lives, 1);
        assert_eq!(policy.remaining_secs(None, 0), None);
    }

    #[test]
    fn remaining_counts_down() {
        let policy = LivesPolicy::default();
        assert_eq!(policy.remaining_secs(Some(0), 0), Some(1800));
        assert_eq!(policy.remaining_secs(Some(0), 1799_500), Some(1));
        assert_eq!(policy.remaining_secs(Some(0), 2000_000), Some(0));
    }

    #[test]
    fn parse_mode_names() {
        assert_eq!(RegenerationMode::parse("per_life"), Some(RegenerationMode::PerLife));
        assert_eq!(RegenerationMode::parse("FULL"), Some(RegenerationMode::FullRefill));
        assert_eq!(RegenerationMode::parse("weekly"), None);
    }
}
