//! Output renderers for a filtered story view.

use std::io::Write;

use serde::Serialize;
use wolfstory_core::{
  FilteredView,
  entry::{Entry, EventPayload, Faction, Line, NarrativeEvent, Utterance},
  participant::{Participant, ParticipantId},
  story::{GameState, RoundKind},
};

// ─── Text
// ─────────────────────────────────────────────────────────────────────

pub fn text(out: &mut impl Write, view: &FilteredView<'_>) -> anyhow::Result<()> {
  let story = view.story();
  writeln!(out, "{}", story.title())?;
  match (story.state(), story.winner()) {
    (GameState::Concluded, Some(winner)) => writeln!(out, "concluded, {winner} won")?,
    (state, _) => writeln!(out, "{state}")?,
  }

  for round in view.rounds() {
    writeln!(out)?;
    writeln!(out, "── day {} ({}) ──", round.index(), round.kind())?;
    for entry in round.entries() {
      match entry {
        Entry::Utterance(u) => utterance(out, u)?,
        Entry::Event(e) => event(out, e)?,
      }
    }
  }
  Ok(())
}

fn utterance(out: &mut impl Write, u: &Utterance) -> anyhow::Result<()> {
  let time = u.time.map(|t| t.to_string()).unwrap_or_default();
  writeln!(out, "[{}] {} {time}", u.kind, u.speaker)?;
  lines(out, &u.lines)
}

fn event(out: &mut impl Write, e: &NarrativeEvent) -> anyhow::Result<()> {
  let subjects: Vec<&str> = e
    .payload
    .participants()
    .into_iter()
    .map(ParticipantId::as_str)
    .collect();
  match &e.payload {
    EventPayload::GameOver { winner: Some(w) } => {
      writeln!(out, "* {} ({w})", e.category())?
    }
    _ if subjects.is_empty() => writeln!(out, "* {}", e.category())?,
    _ => writeln!(out, "* {}: {}", e.category(), subjects.join(", "))?,
  }
  lines(out, &e.lines)
}

fn lines(out: &mut impl Write, lines: &[Line]) -> anyhow::Result<()> {
  for line in lines {
    writeln!(out, "    {}", line.plain_text())?;
  }
  Ok(())
}

// ─── JSON
// ─────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonView<'a> {
  title:        &'a str,
  state:        GameState,
  winner:       Option<Faction>,
  participants: &'a [Participant],
  rounds:       Vec<JsonRound<'a>>,
}

#[derive(Serialize)]
struct JsonRound<'a> {
  index:   u32,
  kind:    RoundKind,
  entries: Vec<&'a Entry>,
}

pub fn json(out: &mut impl Write, view: &FilteredView<'_>) -> anyhow::Result<()> {
  let story = view.story();
  let doc = JsonView {
    title:        story.title(),
    state:        story.state(),
    winner:       story.winner(),
    participants: story.participants(),
    rounds:       view
      .rounds()
      .map(|round| JsonRound {
        index:   round.index(),
        kind:    round.kind(),
        entries: round.entries().collect(),
      })
      .collect(),
  };
  serde_json::to_writer_pretty(&mut *out, &doc)?;
  writeln!(out)?;
  Ok(())
}
