//! First-launch catalog: categories, their levels and the seven-day reward
//! cycle, embedded from `seed/catalog.json`.

use puzzle::model::{
    DEFAULT_COINS_REWARD, DEFAULT_HINT_COST, DEFAULT_MAX_LIVES, DEFAULT_STARS_REWARD,
};
use puzzle::{Category, CategoryType, DailyReward, Level, RewardType};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::dao::{CategoryDao, CategoryStatsDao, DailyRewardDao, LevelDao};
use crate::persistence::PersistenceError;

const CATALOG_JSON: &str = include_str!("../../../seed/catalog.json");

#[derive(Debug, Deserialize)]
struct Catalog {
    categories: Vec<SeedCategory>,
    daily_rewards: Vec<SeedReward>,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    id: i64,
    category_type: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    sort_order: i64,
    #[serde(default)]
    is_unlocked: bool,
    #[serde(default)]
    required_stars: i64,
    #[serde(default)]
    required_coins: i64,
    #[serde(default)]
    required_vip_points: i64,
    #[serde(default)]
    is_vip_category: bool,
    #[serde(default)]
    is_daily_category: bool,
    levels: Vec<SeedLevel>,
}

#[derive(Debug, Deserialize)]
struct SeedLevel {
    question: String,
    answer: String,
    /// One tile per character.
    letters: String,
    image: Option<String>,
    max_lives: Option<u32>,
    hint_cost: Option<i64>,
    stars_reward: Option<u32>,
    coins_reward: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SeedReward {
    day: u32,
    reward_type: String,
    amount: i64,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    is_special_reward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub skipped: bool,
    pub categories: usize,
    pub levels: usize,
    pub daily_rewards: usize,
}

fn parse_catalog() -> Result<Catalog, PersistenceError> {
    Ok(serde_json::from_str(CATALOG_JSON)?)
}

impl SeedCategory {
    fn to_category(&self) -> Result<Category, PersistenceError> {
        let category_type = CategoryType::parse(&self.category_type).ok_or_else(|| {
            PersistenceError::InvalidData(format!("unknown category type '{}'", self.category_type))
        })?;
        Ok(Category {
            id: self.id,
            category_type,
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            required_stars: self.required_stars,
            required_coins: self.required_coins,
            required_vip_points: self.required_vip_points,
            is_vip_category: self.is_vip_category,
            is_daily_category: self.is_daily_category,
            is_unlocked: self.is_unlocked,
            sort_order: self.sort_order,
            total_levels: 0,
            completed_levels: 0,
        })
    }
}

impl SeedLevel {
    fn to_level(&self, category_id: i64, level_number: u32) -> Level {
        Level {
            id: 0,
            category_id,
            level_number,
            question: self.question.clone(),
            image: self.image.clone(),
            answer: self.answer.clone(),
            available_letters: self.letters.chars().collect(),
            answer_length: self.answer.chars().filter(|c| !c.is_whitespace()).count() as u32,
            max_lives: self.max_lives.unwrap_or(DEFAULT_MAX_LIVES),
            hint_cost: self.hint_cost.unwrap_or(DEFAULT_HINT_COST),
            stars_reward: self.stars_reward.unwrap_or(DEFAULT_STARS_REWARD),
            coins_reward: self.coins_reward.unwrap_or(DEFAULT_COINS_REWARD),
            is_unlocked: level_number == 1,
            is_completed: false,
            stars_earned: 0,
            completion_time: None,
        }
    }
}

impl SeedReward {
    fn to_reward(&self) -> Result<DailyReward, PersistenceError> {
        let reward_type = RewardType::parse(&self.reward_type).ok_or_else(|| {
            PersistenceError::InvalidData(format!("unknown reward type '{}'", self.reward_type))
        })?;
        Ok(DailyReward {
            id: 0,
            day: self.day,
            reward_type,
            amount: self.amount,
            icon: self.icon.clone(),
            is_special_reward: self.is_special_reward,
            is_active: true,
        })
    }
}

/// Insert the embedded catalog in one transaction. Does nothing once any
/// category exists.
pub async fn seed_catalog(pool: &SqlitePool) -> Result<SeedReport, PersistenceError> {
    let mut tx = pool.begin().await?;

    if CategoryDao::count(&mut *tx).await? > 0 {
        return Ok(SeedReport {
            skipped: true,
            ..SeedReport::default()
        });
    }

    let catalog = parse_catalog()?;
    let mut report = SeedReport::default();

    for seed in &catalog.categories {
        CategoryDao::insert(&mut *tx, &seed.to_category()?).await?;
        for (index, level) in seed.levels.iter().enumerate() {
            LevelDao::insert(&mut *tx, &level.to_level(seed.id, index as u32 + 1)).await?;
            report.levels += 1;
        }
        CategoryStatsDao::refresh(&mut *tx, seed.id, None).await?;
        report.categories += 1;
    }

    if DailyRewardDao::count(&mut *tx).await? == 0 {
        for reward in &catalog.daily_rewards {
            DailyRewardDao::insert(&mut *tx, &reward.to_reward()?).await?;
            report.daily_rewards += 1;
        }
    }

    tx.commit().await?;

    info!(
        categories = report.categories,
        levels = report.levels,
        daily_rewards = report.daily_rewards,
        "Seeded catalog"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;
    use puzzle::model::normalize_answer;

    #[test]
    fn every_answer_can_be_spelled_from_its_tiles() {
        let catalog = parse_catalog().unwrap();
        for category in &catalog.categories {
            for level in &category.levels {
                let mut pool: Vec<char> = level.letters.chars().map(|c| c.to_ascii_lowercase()).collect();
                for letter in normalize_answer(&level.answer).chars() {
                    let pos = pool
                        .iter()
                        .position(|&c| c == letter)
                        .unwrap_or_else(|| panic!("{}: no tile for '{letter}'", level.answer));
                    pool.swap_remove(pos);
                }
            }
        }
    }

    #[test]
    fn reward_cycle_covers_seven_days() {
        let catalog = parse_catalog().unwrap();
        let mut days: Vec<u32> = catalog.daily_rewards.iter().map(|r| r.day).collect();
        days.sort_unstable();
        assert_eq!(days, vec![1, 2, 3, 4, 5, 6, 7]);
        let seventh = catalog.daily_rewards.iter().find(|r| r.day == 7).unwrap();
        assert!(seventh.is_special_reward);
        assert_eq!(seventh.amount, 1000);
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let again = seed_catalog(db.pool()).await.unwrap();
        assert!(again.skipped);

        let mut conn = db.pool().acquire().await.unwrap();
        let catalog = parse_catalog().unwrap();
        assert_eq!(
            CategoryDao::count(&mut *conn).await.unwrap(),
            catalog.categories.len() as i64
        );
        assert_eq!(DailyRewardDao::count(&mut *conn).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn first_level_of_every_category_is_unlocked() {
        let db = Database::new_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        for category in CategoryDao::list(&mut *conn).await.unwrap() {
            let levels = LevelDao::list_by_category(&mut *conn, category.id).await.unwrap();
            assert!(!levels.is_empty());
            assert_eq!(category.total_levels as usize, levels.len());
            assert!(levels[0].is_unlocked);
            assert!(levels[1..].iter().all(|l| !l.is_unlocked));
        }
    }

    #[tokio::test]
    async fn only_the_starter_category_is_unlocked() {
        let db = Database::new_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let categories = CategoryDao::list(&mut *conn).await.unwrap();
        assert_eq!(categories[0].category_type, CategoryType::Countries);
        assert!(categories[0].is_unlocked);
        assert!(categories[1..].iter().all(|c| !c.is_unlocked));
        let stats = CategoryStatsDao::find(&mut *conn, categories[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.completed_levels, 0);
    }
}
