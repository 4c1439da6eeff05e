//! Word quest command-line front end.
//!
//! Opens the local SQLite database in the data directory (seeding the
//! catalog on first run) and exposes the home screen intents as
//! subcommands. `play` runs an interactive level session on stdin.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use progression::config::{self, GameConfig};
use progression::persistence::sqlite::{
    Database, SqliteDailyRewardRepository, SqliteGameRepository,
};
use progression::persistence::{DailyRewardRepository, GameRepository, PersistenceError};
use progression::rewards::{AdOutcome, Reward};
use progression::session::SessionError;
use progression::settings::{SettingValue, SettingsStore};
use progression::{HomeState, HomeViewModel};
use puzzle::{Clock, SystemClock};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod play;

#[derive(Parser)]
#[command(name = "wordquest", about = "Guess the word from a pool of letter tiles")]
struct Cli {
    /// Data directory. Defaults to WORDQUEST_DATA_DIR or the platform data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories with completion and unlock state.
    Categories,
    /// List the levels of a category.
    Levels { category_id: i64 },
    /// Spend stars and coins (or VIP points) to unlock a category.
    Unlock { category_id: i64 },
    /// Play a level interactively.
    Play { level_id: i64 },
    /// Daily reward status and claims.
    Daily {
        #[command(subcommand)]
        action: Option<DailyAction>,
    },
    /// Show the player's wallet and totals.
    Progress,
    /// Simulate a completed rewarded ad granting coins.
    Ad {
        #[arg(default_value_t = 25)]
        coins: i64,
    },
    /// Inspect or change settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum DailyAction {
    Status,
    Claim {
        /// Claim with the doubled multiplier earned from an ad.
        #[arg(long)]
        doubled: bool,
    },
    History,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    /// Set a key. Values are read as JSON, falling back to plain text.
    Set { key: String, value: String },
    /// Write all settings as JSON to a file, or stdout.
    Export { path: Option<PathBuf> },
    /// Replace all settings from a JSON file.
    Import { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("storage error: {0}")]
    Storage(#[from] PersistenceError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("category {0} does not exist")]
    UnknownCategory(i64),

    #[error("rewarded ad is cooling down")]
    AdCooldown,
}

pub(crate) struct App {
    game: Arc<SqliteGameRepository>,
    daily: Arc<SqliteDailyRewardRepository>,
    clock: Arc<dyn Clock>,
    config: GameConfig,
    settings: SettingsStore,
}

impl App {
    async fn open(data_dir: PathBuf) -> Result<Self, CliError> {
        let db = Database::open(&config::database_path(&data_dir)).await?;
        let pool = db.pool().clone();
        Ok(Self {
            game: Arc::new(SqliteGameRepository::new(pool.clone())),
            daily: Arc::new(SqliteDailyRewardRepository::new(pool)),
            clock: Arc::new(SystemClock),
            config: GameConfig::from_env(),
            settings: SettingsStore::open(config::settings_path(&data_dir))?,
        })
    }

    fn home(&self) -> HomeViewModel<SqliteGameRepository, SqliteDailyRewardRepository> {
        HomeViewModel::new(self.game.clone(), self.daily.clone(), self.clock.clone())
    }
}

fn print_messages(state: &HomeState) {
    if let Some(info) = &state.info_message {
        println!("{info}");
    }
    if let Some(err) = &state.error_message {
        eprintln!("error: {err}");
    }
}

fn print_categories(state: &HomeState) {
    for card in &state.categories {
        let c = &card.category;
        let lock = if c.is_unlocked {
            "open"
        } else if card.can_unlock {
            "can unlock"
        } else {
            "locked"
        };
        let cost = if c.is_vip_category {
            format!("{} VIP", c.required_vip_points)
        } else {
            format!("{}★ {}c", c.required_stars, c.required_coins)
        };
        println!(
            "{:>3}  {:<14} {:>3}%  {}/{}  [{lock}, {cost}]",
            c.id, c.name, card.completion_percent, c.completed_levels, c.total_levels
        );
    }
}

async fn run_levels(app: &App, category_id: i64) -> Result<(), CliError> {
    let category = app
        .game
        .category(category_id)
        .await?
        .ok_or(CliError::UnknownCategory(category_id))?;
    println!("{} ({})", category.name, category.description);
    for level in app.game.levels(category_id).await? {
        let status = if level.is_completed {
            format!("{}★ in {}s", level.stars_earned, level.completion_time.unwrap_or(0))
        } else if puzzle::rules::is_level_playable(&category, &level) {
            "open".to_string()
        } else {
            "locked".to_string()
        };
        println!("{:>5}  #{:<3} {:<40} {status}", level.id, level.level_number, level.question);
    }
    Ok(())
}

async fn run_daily(app: &App, action: Option<DailyAction>) -> Result<(), CliError> {
    match action.unwrap_or(DailyAction::Status) {
        DailyAction::Status => {
            let state = app.home().refresh().await;
            print_messages(&state);
            if let Some(daily) = state.daily {
                let offer = daily
                    .reward
                    .map(|r| format!("{} {}", r.amount, r.reward_type.currency()))
                    .unwrap_or_else(|| "nothing".to_string());
                let when = if daily.can_claim { "available now" } else { "claimed today" };
                println!("Day {} of 7: {offer} ({when})", daily.cycle_day);
                println!(
                    "Streak {} (longest {}), {} claims, {} missed days",
                    daily.stats.current_streak,
                    daily.stats.longest_streak,
                    daily.stats.total_claims,
                    daily.stats.missed_days
                );
            }
        }
        DailyAction::Claim { doubled } => {
            let state = app.home().claim_daily_reward(doubled).await;
            print_messages(&state);
        }
        DailyAction::History => {
            for claim in app.daily.claims().await? {
                println!(
                    "{}  streak {}  +{} (x{})",
                    claim.claim_date, claim.day_streak, claim.claimed_amount, claim.bonus_multiplier
                );
            }
        }
    }
    Ok(())
}

fn run_settings(app: &mut App, action: SettingsAction) -> Result<(), CliError> {
    match action {
        SettingsAction::Show => println!("{}", app.settings.export_json()?),
        SettingsAction::Set { key, value } => {
            let parsed = serde_json::from_str(&value)
                .ok()
                .and_then(|json| SettingValue::from_json(&json))
                .unwrap_or(SettingValue::Text(value));
            app.settings.set(&key, parsed)?;
        }
        SettingsAction::Export { path } => {
            let json = app.settings.export_json()?;
            match path {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        SettingsAction::Import { path } => {
            let json = std::fs::read_to_string(path)?;
            let count = app.settings.import_json(&json)?;
            println!("Imported {count} settings");
        }
    }
    Ok(())
}

async fn run(cli: Cli, data_dir: PathBuf) -> Result<(), CliError> {
    let mut app = App::open(data_dir).await?;
    if app.settings.is_first_launch() {
        println!("Welcome to Word Quest! Start with `wordquest categories`.");
        app.settings.mark_launched()?;
    }

    match cli.command {
        Commands::Categories => {
            let state = app.home().refresh().await;
            print_messages(&state);
            print_categories(&state);
        }
        Commands::Levels { category_id } => run_levels(&app, category_id).await?,
        Commands::Unlock { category_id } => {
            let state = app.home().unlock_category(category_id).await;
            print_messages(&state);
        }
        Commands::Play { level_id } => play::run(&mut app, level_id).await?,
        Commands::Daily { action } => run_daily(&app, action).await?,
        Commands::Progress => {
            let p = app.game.progress().await?;
            println!("Stars {}  Coins {}  VIP {}", p.total_stars, p.total_coins, p.vip_points);
            println!(
                "Completed {} levels ({} perfect), {} hints used, {}s played",
                p.total_completed_levels, p.perfect_levels, p.hints_used, p.total_play_time
            );
        }
        Commands::Ad { coins } => {
            let now = app.clock.now_millis();
            if !app
                .settings
                .can_show_rewarded(now, app.config.rewarded_cooldown_secs)
            {
                return Err(CliError::AdCooldown);
            }
            app.settings.record_rewarded_ad(now)?;
            let state = app
                .home()
                .on_ad_result(AdOutcome::Rewarded(Reward::coins(coins)))
                .await;
            print_messages(&state);
        }
        Commands::Settings { action } => run_settings(&mut app, action)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(config::get_data_dir);

    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "wordquest");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(data_dir = %data_dir.display(), "wordquest starting");
    run(cli, data_dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_opens_seeded_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(dir.path().to_path_buf()).await.unwrap();

        let state = app.home().refresh().await;
        assert_eq!(state.categories.len(), 7);
        assert!(dir.path().join("wordquest.db").exists());
        assert!(app.settings.is_first_launch());
    }

    #[tokio::test]
    async fn test_settings_set_types_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::open(dir.path().to_path_buf()).await.unwrap();

        let set = |key: &str, value: &str| SettingsAction::Set {
            key: key.to_string(),
            value: value.to_string(),
        };
        run_settings(&mut app, set("sound_enabled", "false")).unwrap();
        run_settings(&mut app, set("language", "de")).unwrap();
        run_settings(&mut app, set("volume", "7")).unwrap();

        assert!(!app.settings.sound_enabled());
        assert_eq!(app.settings.language(), "de");
        assert_eq!(app.settings.get_int("volume", 0), 7);
    }

    #[test]
    fn test_cli_parses_daily_claim() {
        let cli = Cli::try_parse_from(["wordquest", "daily", "claim", "--doubled"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Daily {
                action: Some(DailyAction::Claim { doubled: true })
            }
        ));
    }
}
