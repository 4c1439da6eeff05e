//! Rewarded-ad callback contract. The ad network itself lives outside the
//! core; only its result is handled here.

use puzzle::{Currency, RewardType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    Currency(Currency),
    /// Restore the current level's lives.
    Lives,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub kind: RewardKind,
    pub amount: i64,
}

impl Reward {
    pub fn coins(amount: i64) -> Self {
        Self {
            kind: RewardKind::Currency(Currency::Coins),
            amount,
        }
    }

    pub fn lives() -> Self {
        Self {
            kind: RewardKind::Lives,
            amount: 0,
        }
    }
}

impl From<(RewardType, i64)> for Reward {
    fn from((reward_type, amount): (RewardType, i64)) -> Self {
        Self {
            kind: RewardKind::Currency(reward_type.currency()),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdOutcome {
    Rewarded(Reward),
    /// Closed before the reward was earned.
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_gift_rewards_coins() {
        let reward = Reward::from((RewardType::SpecialGift, 1000));
        assert_eq!(reward.kind, RewardKind::Currency(Currency::Coins));
        assert_eq!(reward.amount, 1000);
    }
}
