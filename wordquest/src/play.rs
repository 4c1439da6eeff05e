//! Interactive level session on stdin.

use progression::rewards::{AdOutcome, Reward};
use progression::session::{
    spawn_level_session, LevelEvent, LevelSessionHandle, LevelSnapshot, SessionError,
};
use puzzle::{Clock, HintKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::{App, CliError};

const HELP: &str = "\
Type a letter (or a tile number) to place it.
  del      remove the last letter     clear    remove all letters
  hint     hide random wrong tiles    hint2    hide two wrong tiles
  pause    pause the timer            resume   resume the timer
  restart  start over                 refill   buy lives with coins
  ad       watch an ad for lives      quit     leave the level";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Input {
    Letter(char),
    Tile(usize),
    Delete,
    Clear,
    Hint(HintKind),
    Pause,
    Resume,
    Restart,
    Refill,
    Ad,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let word = line.trim().to_ascii_lowercase();
    let input = match word.as_str() {
        "" => return None,
        "del" | "delete" | "back" => Input::Delete,
        "clear" => Input::Clear,
        "hint" => Input::Hint(HintKind::RemoveRandomLetters),
        "hint2" => Input::Hint(HintKind::RemoveTwoLetters),
        "pause" => Input::Pause,
        "resume" => Input::Resume,
        "restart" => Input::Restart,
        "refill" => Input::Refill,
        "ad" => Input::Ad,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => {
            if let Ok(tile) = other.parse::<usize>() {
                Input::Tile(tile)
            } else {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_alphabetic() => Input::Letter(c),
                    _ => return None,
                }
            }
        }
    };
    Some(input)
}

/// First free tile showing `letter`.
fn tile_for_letter(snapshot: &LevelSnapshot, letter: char) -> Option<usize> {
    snapshot
        .selectable()
        .find(|t| t.letter.eq_ignore_ascii_case(&letter))
        .map(|t| t.index)
}

fn render(snapshot: &LevelSnapshot) {
    let slots: String = snapshot
        .player_answer
        .chars()
        .chain(std::iter::repeat('_'))
        .take(snapshot.answer_length as usize)
        .collect();
    let tiles: Vec<String> = snapshot
        .tiles
        .iter()
        .map(|t| {
            if t.removed {
                format!("{}:·", t.index)
            } else if t.selected {
                format!("{}:({})", t.index, t.letter)
            } else {
                format!("{}:{}", t.index, t.letter)
            }
        })
        .collect();

    println!();
    println!("Level {} - {}", snapshot.level_number, snapshot.question);
    println!("  {slots}");
    println!("  {}", tiles.join("  "));
    let mut status = format!(
        "  lives {}/{}  hints {} ({} coins)  {}s",
        snapshot.current_lives,
        snapshot.max_lives,
        snapshot.hints_used,
        snapshot.hint_cost,
        snapshot.elapsed_secs
    );
    if snapshot.is_paused {
        status.push_str("  [paused]");
    }
    if let Some(secs) = snapshot.next_life_in_secs {
        status.push_str(&format!("  next life in {secs}s"));
    }
    println!("{status}");
    if let Some(info) = &snapshot.info_message {
        println!("  {info}");
    }
    if let Some(err) = &snapshot.error_message {
        eprintln!("  error: {err}");
    }
}

async fn apply(
    handle: &LevelSessionHandle,
    snapshot: &LevelSnapshot,
    input: Input,
) -> Result<LevelSnapshot, SessionError> {
    match input {
        Input::Letter(letter) => match tile_for_letter(snapshot, letter) {
            Some(tile) => handle.select_tile(tile).await,
            None => {
                println!("  No free '{letter}' tile");
                handle.get_snapshot().await
            }
        },
        Input::Tile(tile) => handle.select_tile(tile).await,
        Input::Delete => handle.delete_last().await,
        Input::Clear => handle.clear_all().await,
        Input::Hint(kind) => handle.use_hint(kind).await,
        Input::Pause => handle.pause().await,
        Input::Resume => handle.resume().await,
        Input::Restart => handle.restart().await,
        Input::Refill => handle.refill_lives().await,
        Input::Ad => handle.on_ad_result(AdOutcome::Rewarded(Reward::lives())).await,
        Input::Help | Input::Quit => handle.get_snapshot().await,
    }
}

/// Bookkeeping after a solve: rating prompt and interstitial cadence.
fn after_completion(app: &mut App, snapshot: &LevelSnapshot) -> Result<(), CliError> {
    if let Some(completion) = &snapshot.completion {
        println!(
            "Solved! {}★ +{} coins in {}s{}",
            completion.stars_earned,
            completion.coins_earned,
            completion.completion_time,
            if completion.perfect { " (perfect)" } else { "" }
        );
        if completion.category_completed {
            println!("Category complete!");
        }
        if let Some(next) = completion.next_level_id {
            println!("Next: wordquest play {next}");
        }
    }

    app.settings.record_level_completed()?;
    if app
        .settings
        .should_prompt_rating(app.config.rating_prompt_threshold)
    {
        println!("Enjoying Word Quest? Please consider rating it.");
        app.settings.mark_rating_prompt_shown()?;
    }

    let now = app.clock.now_millis();
    if app
        .settings
        .can_show_interstitial(now, app.config.interstitial_cooldown_secs)
    {
        tracing::debug!("Interstitial ad slot");
        app.settings.record_interstitial_ad(now)?;
    }
    Ok(())
}

pub(crate) async fn run(app: &mut App, level_id: i64) -> Result<(), CliError> {
    let handle = spawn_level_session(
        app.game.clone(),
        app.clock.clone(),
        app.config.clone(),
        level_id,
    )
    .await?;
    let (mut snapshot, mut events) = handle.subscribe().await?;

    if !app.settings.tutorial_completed() {
        println!("{HELP}");
        app.settings.mark_tutorial_completed()?;
    }
    render(&snapshot);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(input) = parse_input(&line) else {
                    println!("Unknown input, type `help`");
                    continue;
                };
                match input {
                    Input::Quit => break,
                    Input::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    _ => {}
                }
                match apply(&handle, &snapshot, input).await {
                    Ok(next) => {
                        snapshot = next;
                        render(&snapshot);
                        if snapshot.is_solved() {
                            after_completion(app, &snapshot)?;
                            break;
                        }
                    }
                    Err(SessionError::Internal(msg)) => {
                        handle.shutdown().await;
                        return Err(SessionError::Internal(msg).into());
                    }
                    Err(e) => println!("  {e}"),
                }
            }
            event = events.recv() => match event {
                Ok(LevelEvent::StateChanged(next)) if next.current_lives > snapshot.current_lives => {
                    snapshot = next;
                    println!("  Lives restored");
                    render(&snapshot);
                }
                Ok(LevelEvent::Error(msg)) => eprintln!("  error: {msg}"),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(" F "), Some(Input::Letter('f')));
        assert_eq!(parse_input("3"), Some(Input::Tile(3)));
        assert_eq!(parse_input("DEL"), Some(Input::Delete));
        assert_eq!(
            parse_input("hint"),
            Some(Input::Hint(HintKind::RemoveRandomLetters))
        );
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("xyz"), None);
    }
}
