//! Command-line interface for genie.
//!
//! One-shot commands talk to the genie service directly; `play` runs a
//! whole session driven by lines on stdin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{GenieBackend, HttpBackend, WishRequest};
use crate::audio::Utterance;
use crate::config::{self, GameSettings};
use crate::domain::{DoorId, RuleBook, WishVerdict};

pub mod play;

/// genie - voice-driven escape room client
#[derive(Parser, Debug)]
#[command(name = "genie")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Genie service URL (overrides config)
    #[arg(long, global = true, env = "GENIE_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the three door laws
    Rules,

    /// Send a recorded wish and show the genie's verdict
    Wish {
        /// WAV file holding the wish
        file: PathBuf,

        /// Door the wish is for
        #[arg(short, long, default_value = "1")]
        door: i64,
    },

    /// Ask for the next hint on a door
    Hint {
        /// Door to ask about
        #[arg(short, long, default_value = "1")]
        door: i64,
    },

    /// Fetch the genie's opening monologue
    Intro,

    /// Play a session from stdin commands
    Play {
        /// Asset catalog (overrides config)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Skip the intro narration
        #[arg(long)]
        no_intro: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let mut settings = config::config()?.clone();
        if let Some(server) = self.server {
            settings.server_url = server;
        }

        match self.command {
            Commands::Rules => show_rules(&settings).await,
            Commands::Wish { file, door } => send_wish(&settings, &file, door).await,
            Commands::Hint { door } => show_hint(&settings, door).await,
            Commands::Intro => show_intro(&settings).await,
            Commands::Play { assets, no_intro } => {
                if assets.is_some() {
                    settings.assets = assets;
                }
                play::run(settings, !no_intro).await
            }
            Commands::Config => show_config(&settings),
        }
    }
}

/// Build the HTTP backend from settings
pub fn backend(settings: &GameSettings) -> Result<Arc<dyn GenieBackend>> {
    let backend = HttpBackend::new(&settings.server_url, settings.request_timeout())
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(backend))
}

fn parse_door(door: i64) -> Result<DoorId> {
    DoorId::new(door).with_context(|| format!("Invalid door: {}", door))
}

/// Print the door laws
async fn show_rules(settings: &GameSettings) -> Result<()> {
    let backend = backend(settings)?;

    let (rules, from_service) = RuleBook::from_response(backend.get_rules().await);
    if !from_service {
        eprintln!("⚠️  The genie's rules are unavailable, showing default rules");
    }

    for (door, rule) in rules.iter() {
        println!("🚪 Door {}: {}", door, rule.law);
        for clue in &rule.clues {
            println!("     - {}", clue);
        }
    }

    Ok(())
}

/// Send one wish from a WAV file
async fn send_wish(settings: &GameSettings, file: &Path, door: i64) -> Result<()> {
    let door = parse_door(door)?;
    let backend = backend(settings)?;

    let utterance = Utterance::from_wav_file(file)
        .with_context(|| format!("Failed to read wish: {}", file.display()))?;
    let audio = utterance.to_wav().context("Failed to encode wish")?;

    let (rules, _) = RuleBook::from_response(backend.get_rules().await);

    println!(
        "🎙️  Sending {:.1}s wish for door {}...",
        utterance.duration().as_secs_f32(),
        door
    );

    let verdict = backend
        .process_wish(WishRequest {
            door,
            door_rules: rules.law_text(door),
            audio,
        })
        .await?;

    print_verdict(&verdict);
    Ok(())
}

pub(crate) fn print_verdict(verdict: &WishVerdict) {
    println!("{}", render_verdict(verdict));
}

fn render_verdict(verdict: &WishVerdict) -> String {
    let mut lines = vec![format!("🧞 {}", verdict.label())];
    if !verdict.object_name.is_empty() {
        lines.push(format!("   Object: {}", verdict.object_name));
    }
    if let Some(color) = verdict.color() {
        lines.push(format!("   Color:  {}", color.to_hex()));
    }
    if let Some(scale) = verdict.scale_factor() {
        lines.push(format!("   Scale:  {}", scale));
    }
    lines.push(format!("   VFX:    {}", verdict.vfx()));
    if !verdict.drop_voice.is_empty() {
        lines.push(format!("   \"{}\"", verdict.drop_voice));
    }
    lines.join("\n")
}

/// Print the next hint for a door
async fn show_hint(settings: &GameSettings, door: i64) -> Result<()> {
    let door = parse_door(door)?;
    let hint = backend(settings)?.get_hint(door).await?;

    println!(
        "💡 Hint {} for door {} ({} left)",
        hint.hint_level, door, hint.hints_remaining
    );
    println!("   {}", hint.hint);
    Ok(())
}

async fn show_intro(settings: &GameSettings) -> Result<()> {
    let intro = backend(settings)?.intro().await?;
    println!("🧞 {}", intro.subtitle);
    if !intro.audio_url.is_empty() {
        println!("   Audio: {}", intro.audio_url);
    }
    Ok(())
}

fn show_config(cfg: &GameSettings) -> Result<()> {
    println!("Genie Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Server:");
    println!("  URL:     {}", cfg.server_url);
    println!("  Timeout: {}s", cfg.request_timeout_secs);
    println!();
    println!("Recording:");
    println!("  Max length:  {}s", cfg.recording_length_secs);
    println!("  Sample rate: {} Hz", cfg.sample_rate);
    println!("  Channels:    {}", cfg.channels);
    println!();
    println!("Narration fallback: {}s", cfg.narration_fallback_secs);
    println!("Pickup range:       {}", cfg.pickup_range);
    println!("Door range:         {}", cfg.door_range);
    println!(
        "Assets:             {}",
        cfg.assets
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    );

    Ok(())
}
