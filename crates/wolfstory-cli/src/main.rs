//! wolfstory: decode an archived village transcript and print a filtered
//! view of it.
//!
//! Reads `wolfstory.toml` (or the path given with `--config`) and
//! `WOLFSTORY_*` environment variables for defaults; command-line flags
//! override both.
//!
//! ```text
//! wolfstory village.xml --kind faction --participant gerd
//! WOLFSTORY_FORMAT=json wolfstory village.xml --event elimination
//! ```

mod render;

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wolfstory_core::{
  FilterSpec, apply_filter,
  entry::{EventCategory, UtteranceKind},
  participant::ParticipantId,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Format {
  #[default]
  Text,
  Json,
}

#[derive(Parser)]
#[command(author, version, about = "Werewolf transcript reader")]
struct Cli {
  /// Transcript to decode.
  transcript: PathBuf,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "wolfstory.toml")]
  config: PathBuf,

  /// Keep utterances of these kinds (public, faction, private, posthumous).
  #[arg(short, long = "kind", value_delimiter = ',')]
  kinds: Vec<UtteranceKind>,

  /// Keep events of these categories (announcement, arrival, vote_tally,
  /// elimination, departure, survival, game_over).
  #[arg(short, long = "event", value_delimiter = ',')]
  events: Vec<EventCategory>,

  /// Keep entries spoken by or naming these participants.
  #[arg(short, long = "participant", value_delimiter = ',')]
  participants: Vec<String>,

  #[arg(short, long, value_enum)]
  format: Option<Format>,
}

/// Defaults read from the config file and environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
  format:       Format,
  kinds:        Vec<UtteranceKind>,
  events:       Vec<EventCategory>,
  participants: Vec<String>,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(
      config::Environment::with_prefix("WOLFSTORY")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("kinds")
        .with_list_parse_key("events")
        .with_list_parse_key("participants"),
    )
    .build()
    .context("failed to read config file")?;
  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;

  let spec = filter_spec(&cli, &cfg);
  let format = cli.format.unwrap_or(cfg.format);

  let file = File::open(&cli.transcript)
    .with_context(|| format!("failed to open {}", cli.transcript.display()))?;
  let story = wolfstory_xml::from_reader(BufReader::new(file))
    .with_context(|| format!("failed to decode {}", cli.transcript.display()))?;

  tracing::info!(
    title = story.title(),
    rounds = story.rounds().len(),
    entries = story.entry_count(),
    "transcript loaded"
  );

  let view = apply_filter(&story, spec);
  let mut out = std::io::stdout().lock();
  match format {
    Format::Text => render::text(&mut out, &view)?,
    Format::Json => render::json(&mut out, &view)?,
  }
  Ok(())
}

/// Flags win over config; an empty list on both sides leaves that
/// dimension unconstrained.
fn filter_spec(cli: &Cli, cfg: &CliConfig) -> FilterSpec {
  fn pick<'a, T>(flag: &'a [T], config: &'a [T]) -> &'a [T] {
    if flag.is_empty() { config } else { flag }
  }

  let mut spec = FilterSpec::new();
  let kinds = pick(&cli.kinds, &cfg.kinds);
  if !kinds.is_empty() {
    spec = spec.with_utterance_kinds(kinds.iter().copied());
  }
  let events = pick(&cli.events, &cfg.events);
  if !events.is_empty() {
    spec = spec.with_event_categories(events.iter().copied());
  }
  let participants = pick(&cli.participants, &cfg.participants);
  if !participants.is_empty() {
    spec = spec.with_participants(
      participants.iter().map(|p| ParticipantId::new(p.as_str())),
    );
  }
  spec
}
