//! Text-driven play session.
//!
//! Stands in for the game engine: the scene and audio output only log, and
//! the player's position is reduced to "near the door", "near an item" or
//! "away". Commands are read one per line from stdin:
//!
//! - `record <file.wav>` - wish with a recorded utterance
//! - `near door` / `near item` / `away` - move the player
//! - `act` - press the action input
//! - `hint` - ask for a hint
//! - `status` - show door and interaction phase
//! - `quit`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::audio::{LoggingSink, Utterance};
use crate::config::GameSettings;
use crate::core::{ActionOutcome, Orchestrator, Proximity, SubmitOutcome};
use crate::domain::{SessionEvent, SessionEventKind};
use crate::scene::LoggingScene;

use super::{backend, print_verdict};

/// Where the player stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Away,
    NearDoor,
    NearItem,
}

/// One parsed stdin line
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Record(&'a str),
    Move(Position),
    Act,
    Hint,
    Status,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match (word, rest) {
        ("record", path) if !path.is_empty() => Command::Record(path),
        ("near", "door") => Command::Move(Position::NearDoor),
        ("near", "item") => Command::Move(Position::NearItem),
        ("away", "") => Command::Move(Position::Away),
        ("act", "") => Command::Act,
        ("hint", "") => Command::Hint,
        ("status", "") => Command::Status,
        ("quit", "") | ("exit", "") => Command::Quit,
        _ => Command::Unknown(line),
    };
    Some(command)
}

/// Run an interactive session until stdin closes or the escape completes
pub async fn run(settings: GameSettings, intro: bool) -> Result<()> {
    let backend = backend(&settings)?;
    let (game, events) = Orchestrator::start(
        backend,
        Arc::new(LoggingScene),
        Arc::new(LoggingSink),
        settings,
    )
    .await?;

    let printer = tokio::spawn(print_events(events));

    if intro {
        if let Err(e) = game.play_intro().await {
            eprintln!("⚠️  {:#}", e);
        }
    }

    println!("🚪 {}", game.rules().await.law_text(game.door().await));
    println!("Commands: record <wav>, near door, near item, away, act, hint, status, quit");

    let mut position = Position::Away;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(command) = parse_command(&line) else {
            continue;
        };

        match command {
            Command::Record(path) => wish(&game, Path::new(path)).await,
            Command::Move(to) => position = to,
            Command::Act => {
                let proximity = proximity(&game, position).await;
                match game.perform_action(&proximity).await {
                    ActionOutcome::NoOp => println!("Nothing to do here"),
                    ActionOutcome::UsedSuccessfully(_) => game.wait_for_sequence().await,
                    _ => {}
                }
            }
            Command::Hint => {
                if let Err(e) = game.request_hint().await {
                    eprintln!("⚠️  {:#}", e);
                }
            }
            Command::Status => {
                println!(
                    "Door {} | {:?} | position {:?}",
                    game.door().await,
                    game.phase().await,
                    position
                );
            }
            Command::Quit => break,
            Command::Unknown(line) => eprintln!("Unknown command: {}", line),
        }

        if game.escaped().await {
            break;
        }
    }

    game.cancel_sequences().await;
    drop(game);
    let _ = printer.await;
    Ok(())
}

async fn wish(game: &Arc<Orchestrator>, path: &Path) {
    let audio = Utterance::from_wav_file(path)
        .map_err(anyhow::Error::from)
        .and_then(|u| Ok(u.to_wav()?));

    let audio = match audio {
        Ok(audio) => audio,
        Err(e) => {
            eprintln!("⚠️  Cannot read {}: {:#}", path.display(), e);
            return;
        }
    };

    match game.submit_wish(audio).await {
        Ok(SubmitOutcome::Granted { verdict, .. }) => print_verdict(&verdict),
        Ok(SubmitOutcome::Busy) => println!("⏳ The genie is still thinking"),
        Ok(SubmitOutcome::Empty) => println!("Nothing was heard"),
        Err(e) => eprintln!("❌ {:#}", e),
    }
}

async fn proximity(game: &Orchestrator, position: Position) -> Proximity {
    match position {
        Position::Away => Proximity::default(),
        Position::NearDoor => Proximity::near_door(),
        Position::NearItem => match game.pickupable_objects().await.first() {
            Some(id) => Proximity::near_object(*id),
            None => Proximity::default(),
        },
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event.kind {
            SessionEventKind::NarrationStarted { subtitle } if !subtitle.is_empty() => {
                println!("🧞 \"{}\"", subtitle)
            }
            SessionEventKind::ObjectPickedUp { object } => println!("🤚 Holding {}", object.short()),
            SessionEventKind::ObjectDropped { object } => println!("📦 Dropped {}", object.short()),
            SessionEventKind::ObjectRejected { door, .. } => {
                println!("🔒 Door {} stays shut", door)
            }
            SessionEventKind::DoorOpened { door } => println!("🚪 Door {} opens!", door),
            SessionEventKind::RoomAdvanced { door } => println!("➡️  Entering room {}", door),
            SessionEventKind::EscapeCompleted => println!("🎉 You escaped!"),
            SessionEventKind::ObjectUnavailable { name } => {
                println!("The genie conjured a {} but it fizzled out", name)
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   "), None);
        assert_eq!(
            parse_command("record wishes/sword.wav"),
            Some(Command::Record("wishes/sword.wav"))
        );
        assert_eq!(
            parse_command(" near door "),
            Some(Command::Move(Position::NearDoor))
        );
        assert_eq!(parse_command("away"), Some(Command::Move(Position::Away)));
        assert_eq!(parse_command("act"), Some(Command::Act));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
        assert_eq!(parse_command("record"), Some(Command::Unknown("record")));
        assert_eq!(parse_command("near moon"), Some(Command::Unknown("near moon")));
    }
}
