//! Element decoders: one per transcript record kind.
//!
//! Each decoder starts on its element's start boundary, reads attributes,
//! walks the children it knows, skips the ones it does not, and leaves the
//! cursor past its own end boundary. Decoders never see the story under
//! construction.
//!
//! [`RecordStream`] drives the decoders over the document in order:
//!
//! ```text
//! village            → Header
//!   avatarList/avatar → Participant
//!   period           → Round
//!     talk           → Utterance
//!     announce, onStage, counting, execution, murdered,
//!     noMurder, suddenDeath, survivor, gameOver → Event
//!   gameState        → GameState
//! ```

use std::io::BufRead;

use tracing::trace;
use wolfstory_core::{
  entry::{
    EliminationCause, EventPayload, Line, NarrativeEvent, Segment, Utterance,
    Vote, VoteCount,
  },
  participant::ParticipantId,
  record::{
    GameStateRecord, HeaderRecord, ParticipantRecord, Record, RecordKind,
    RoundRecord,
  },
};

use crate::{
  error::{Error, Result},
  reader::{NodeKind, TranscriptReader},
  scalar::{
    decode_faction, decode_game_state, decode_number, decode_round_kind,
    decode_time_of_day, decode_utterance_kind,
  },
};

// ─── Attribute helpers ───────────────────────────────────────────────────────

fn expect_start<R: BufRead>(
  reader: &TranscriptReader<R>,
  kind: RecordKind,
  name: &str,
) -> Result<()> {
  if reader.is_start_of(name) {
    return Ok(());
  }
  Err(Error::decode(
    kind,
    reader.offset(),
    format!("expected <{name}>, found {:?} {:?}", reader.kind(), reader.name()),
  ))
}

fn required<R: BufRead>(
  reader: &TranscriptReader<R>,
  kind: RecordKind,
  attr: &str,
) -> Result<String> {
  reader
    .attr(attr)?
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| {
      Error::decode(kind, reader.offset(), format!("missing attribute {attr}"))
    })
}

fn optional<R: BufRead>(
  reader: &TranscriptReader<R>,
  attr: &str,
) -> Result<Option<String>> {
  Ok(reader.attr(attr)?.filter(|v| !v.trim().is_empty()))
}

/// Parse a required attribute through `decode`, reporting the raw value on
/// failure.
fn required_with<R: BufRead, T>(
  reader: &TranscriptReader<R>,
  kind: RecordKind,
  attr: &str,
  decode: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
  let raw = required(reader, kind, attr)?;
  decode(&raw).ok_or_else(|| {
    Error::decode(kind, reader.offset(), format!("invalid {attr}: {raw:?}"))
  })
}

fn participant_attr<R: BufRead>(
  reader: &TranscriptReader<R>,
  kind: RecordKind,
  attr: &str,
) -> Result<ParticipantId> {
  required(reader, kind, attr).map(ParticipantId::from)
}

// ─── Children walking ────────────────────────────────────────────────────────

/// Walk the children of the element the cursor is on, then step past its
/// end. `li` children become body lines; every other element is offered to
/// `visit`, which returns `false` to have it skipped.
fn walk_children<R, F>(
  reader: &mut TranscriptReader<R>,
  kind: RecordKind,
  mut visit: F,
) -> Result<Vec<Line>>
where
  R: BufRead,
  F: FnMut(&mut TranscriptReader<R>, &str) -> Result<bool>,
{
  let mut lines = Vec::new();
  reader.descend()?;
  loop {
    match reader.kind() {
      NodeKind::BoundaryEnd => {
        reader.advance()?;
        return Ok(lines);
      }
      NodeKind::EndOfInput => {
        return Err(Error::decode(kind, reader.offset(), "unexpected end of input"));
      }
      NodeKind::Text => reader.advance()?,
      NodeKind::BoundaryStart => {
        let name = reader.name().unwrap_or_default().to_owned();
        if name == "li" {
          lines.push(decode_line(reader)?);
        } else if !visit(reader, &name)? {
          trace!(element = %name, offset = reader.offset(), "skipping unknown element");
          reader.skip_subtree()?;
        }
      }
    }
  }
}

/// A body line: text runs interleaved with `<link href="…">label</link>`.
pub fn decode_line<R: BufRead>(reader: &mut TranscriptReader<R>) -> Result<Line> {
  expect_start(reader, RecordKind::Line, "li")?;
  let mut segments: Vec<Segment> = Vec::new();
  reader.descend()?;
  loop {
    match reader.kind() {
      NodeKind::BoundaryEnd => {
        reader.advance()?;
        return Ok(Line { segments });
      }
      NodeKind::EndOfInput => {
        return Err(Error::decode(
          RecordKind::Line,
          reader.offset(),
          "unexpected end of input",
        ));
      }
      NodeKind::Text => {
        let run = reader.text().unwrap_or_default();
        match segments.last_mut() {
          Some(Segment::Text { text }) => text.push_str(run),
          _ => segments.push(Segment::Text {
            text: run.to_owned(),
          }),
        }
        reader.advance()?;
      }
      NodeKind::BoundaryStart if reader.is_start_of("link") => {
        segments.push(decode_link(reader)?);
      }
      NodeKind::BoundaryStart => reader.skip_subtree()?,
    }
  }
}

fn decode_link<R: BufRead>(reader: &mut TranscriptReader<R>) -> Result<Segment> {
  let href = required(reader, RecordKind::Line, "href")?;
  let mut label = String::new();
  reader.descend()?;
  loop {
    match reader.kind() {
      NodeKind::BoundaryEnd => {
        reader.advance()?;
        break;
      }
      NodeKind::EndOfInput => {
        return Err(Error::decode(
          RecordKind::Line,
          reader.offset(),
          "unexpected end of input",
        ));
      }
      NodeKind::Text => {
        label.push_str(reader.text().unwrap_or_default());
        reader.advance()?;
      }
      NodeKind::BoundaryStart => reader.skip_subtree()?,
    }
  }
  if label.is_empty() {
    label.clone_from(&href);
  }
  Ok(Segment::Link { href, label })
}

// ─── Record decoders ─────────────────────────────────────────────────────────

/// `<village title="…">`. Leaves the cursor on the first child.
pub fn decode_header<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<HeaderRecord> {
  expect_start(reader, RecordKind::Header, "village")?;
  let title = required(reader, RecordKind::Header, "title")?;
  reader.descend()?;
  Ok(HeaderRecord { title })
}

/// `<avatar avatarId="…" fullName="…" faceIconURI="…"/>`
pub fn decode_participant<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<ParticipantRecord> {
  let kind = RecordKind::Participant;
  expect_start(reader, kind, "avatar")?;
  let record = ParticipantRecord {
    id:     participant_attr(reader, kind, "avatarId")?,
    name:   required(reader, kind, "fullName")?,
    avatar: optional(reader, "faceIconURI")?,
  };
  reader.skip_subtree()?;
  Ok(record)
}

/// `<period type="…" day="…">`. Leaves the cursor on the first child; the
/// round's entries follow as separate records.
pub fn decode_round<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<RoundRecord> {
  let kind = RecordKind::Round;
  expect_start(reader, kind, "period")?;
  let record = RoundRecord {
    index: required_with(reader, kind, "day", decode_number)?,
    kind:  required_with(reader, kind, "type", decode_round_kind)?,
  };
  reader.descend()?;
  Ok(record)
}

/// `<gameState state="…" winner="…"/>`
pub fn decode_game_state_marker<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<GameStateRecord> {
  let kind = RecordKind::GameState;
  expect_start(reader, kind, "gameState")?;
  let state = required_with(reader, kind, "state", decode_game_state)?;
  let winner = match optional(reader, "winner")? {
    Some(raw) => Some(decode_faction(&raw).ok_or_else(|| {
      Error::decode(kind, reader.offset(), format!("invalid winner: {raw:?}"))
    })?),
    None => None,
  };
  reader.skip_subtree()?;
  Ok(GameStateRecord { state, winner })
}

/// `<talk type="…" avatarId="…" time="…" xname="…" talkNo="…">`
pub fn decode_utterance<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<Utterance> {
  let kind = RecordKind::Utterance;
  expect_start(reader, kind, "talk")?;
  let mut utterance = Utterance::new(
    participant_attr(reader, kind, "avatarId")?,
    required_with(reader, kind, "type", decode_utterance_kind)?,
  );
  utterance.time = optional(reader, "time")?
    .as_deref()
    .and_then(decode_time_of_day);
  utterance.message_id = optional(reader, "xname")?;
  utterance.number = optional(reader, "talkNo")?
    .as_deref()
    .and_then(decode_number);
  utterance.lines = walk_children(reader, kind, |_, _| Ok(false))?;
  Ok(utterance)
}

/// Element names that decode to narrative events.
pub const EVENT_ELEMENTS: &[&str] = &[
  "announce",
  "onStage",
  "counting",
  "execution",
  "murdered",
  "noMurder",
  "suddenDeath",
  "survivor",
  "gameOver",
];

/// Decode any narrative-event element. The caller checks the name against
/// [`EVENT_ELEMENTS`] first.
pub fn decode_event<R: BufRead>(
  reader: &mut TranscriptReader<R>,
) -> Result<NarrativeEvent> {
  let kind = RecordKind::Event;
  let name = reader.name().unwrap_or_default().to_owned();
  if reader.kind() != NodeKind::BoundaryStart || !EVENT_ELEMENTS.contains(&name.as_str()) {
    return Err(Error::decode(
      kind,
      reader.offset(),
      format!("expected an event element, found {name:?}"),
    ));
  }

  let (payload, lines) = match name.as_str() {
    "onStage" => {
      let participant = participant_attr(reader, kind, "avatarId")?;
      let entry_no = optional(reader, "entryNo")?.as_deref().and_then(decode_number);
      let name = optional(reader, "fullName")?;
      let avatar = optional(reader, "faceIconURI")?;
      let lines = walk_children(reader, kind, |_, _| Ok(false))?;
      (
        EventPayload::Arrival {
          participant,
          entry_no,
          name,
          avatar,
        },
        lines,
      )
    }
    "counting" => {
      let mut votes = Vec::new();
      let lines = walk_children(reader, kind, |r, child| {
        if child != "vote" {
          return Ok(false);
        }
        votes.push(Vote {
          voter:  participant_attr(r, kind, "byWhom")?,
          target: participant_attr(r, kind, "target")?,
        });
        r.skip_subtree()?;
        Ok(true)
      })?;
      (EventPayload::VoteTally { votes }, lines)
    }
    "execution" => {
      let victim = participant_attr(reader, kind, "victim")?;
      let mut tallies = Vec::new();
      let lines = walk_children(reader, kind, |r, child| {
        if child != "nominated" {
          return Ok(false);
        }
        tallies.push(VoteCount {
          participant: participant_attr(r, kind, "avatarId")?,
          count:       required_with(r, kind, "count", decode_number)?,
        });
        r.skip_subtree()?;
        Ok(true)
      })?;
      (
        EventPayload::Elimination {
          cause: EliminationCause::Execution,
          victims: vec![victim],
          tallies,
        },
        lines,
      )
    }
    "murdered" | "survivor" => {
      let mut named = Vec::new();
      let lines = walk_children(reader, kind, |r, child| {
        if child != "avatarRef" {
          return Ok(false);
        }
        named.push(participant_attr(r, kind, "avatarId")?);
        r.skip_subtree()?;
        Ok(true)
      })?;
      let payload = if name == "murdered" {
        EventPayload::Elimination {
          cause:   EliminationCause::Assault,
          victims: named,
          tallies: Vec::new(),
        }
      } else {
        EventPayload::Survival { survivors: named }
      };
      (payload, lines)
    }
    "noMurder" => {
      let lines = walk_children(reader, kind, |_, _| Ok(false))?;
      (
        EventPayload::Elimination {
          cause:   EliminationCause::Assault,
          victims: Vec::new(),
          tallies: Vec::new(),
        },
        lines,
      )
    }
    "suddenDeath" => {
      let participant = participant_attr(reader, kind, "avatarId")?;
      let lines = walk_children(reader, kind, |_, _| Ok(false))?;
      (EventPayload::Departure { participant }, lines)
    }
    "gameOver" => {
      let winner = optional(reader, "winner")?;
      let winner = match winner {
        Some(raw) => Some(decode_faction(&raw).ok_or_else(|| {
          Error::decode(kind, reader.offset(), format!("invalid winner: {raw:?}"))
        })?),
        None => None,
      };
      let lines = walk_children(reader, kind, |_, _| Ok(false))?;
      (EventPayload::GameOver { winner }, lines)
    }
    _ => {
      let lines = walk_children(reader, kind, |_, _| Ok(false))?;
      (EventPayload::Announcement, lines)
    }
  };

  Ok(NarrativeEvent { payload, lines })
}

// ─── Record stream ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
  Document,
  Village,
  Roster,
  Round,
  Done,
}

/// Yields the transcript's records in document order, each with the byte
/// offset of the element it came from.
///
/// Decode and structure errors are stamped with the round and entry
/// ordinal the stream had reached.
pub struct RecordStream<R> {
  reader:  TranscriptReader<R>,
  scope:   Scope,
  round:   Option<u32>,
  entries: usize,
}

impl<R: BufRead> RecordStream<R> {
  pub fn new(reader: TranscriptReader<R>) -> Self {
    Self {
      reader,
      scope: Scope::Document,
      round: None,
      entries: 0,
    }
  }

  /// Offset of the cursor; at the end of the stream, the end of input.
  pub fn offset(&self) -> u64 { self.reader.offset() }

  pub fn next_record(&mut self) -> Result<Option<(Record, u64)>> {
    let next = self.read_record().map_err(|e| {
      e.locate(self.round, self.round.map(|_| self.entries))
    })?;

    match &next {
      Some((Record::Round(round), _)) => {
        self.round = Some(round.index);
        self.entries = 0;
      }
      Some((Record::Utterance(_) | Record::Event(_), _)) => self.entries += 1,
      _ => {}
    }
    Ok(next)
  }

  fn read_record(&mut self) -> Result<Option<(Record, u64)>> {
    loop {
      let offset = self.reader.offset();
      let kind = self.reader.kind();

      match (self.scope, kind) {
        (Scope::Done, _) => return Ok(None),

        (Scope::Document, NodeKind::Text)
          if self.reader.text().is_some_and(|t| t.trim().is_empty()) =>
        {
          self.reader.advance()?
        }
        (Scope::Document, _) => {
          let header = decode_header(&mut self.reader)?;
          self.scope = Scope::Village;
          return Ok(Some((Record::Header(header), offset)));
        }

        (_, NodeKind::EndOfInput) => {
          return Err(Error::structure(offset, "transcript ends inside an open element"));
        }
        (_, NodeKind::Text) => self.reader.advance()?,
        (scope, NodeKind::BoundaryEnd) => {
          self.reader.advance()?;
          self.scope = match scope {
            Scope::Roster | Scope::Round => Scope::Village,
            _ => Scope::Done,
          };
        }

        (scope, NodeKind::BoundaryStart) => {
          if let Some(record) = self.decode_child(scope)? {
            return Ok(Some((record, offset)));
          }
        }
      }
    }
  }

  /// Decode the element start the cursor is on within `scope`, or skip it
  /// and return `None`.
  fn decode_child(&mut self, scope: Scope) -> Result<Option<Record>> {
    let reader = &mut self.reader;
    let name = reader.name().unwrap_or_default().to_owned();

    let record = match (scope, name.as_str()) {
      (Scope::Village, "avatarList") => {
        reader.descend()?;
        self.scope = Scope::Roster;
        return Ok(None);
      }
      (Scope::Village, "period") => {
        let round = decode_round(reader)?;
        self.scope = Scope::Round;
        Record::Round(round)
      }
      (Scope::Village, "gameState") => {
        Record::GameState(decode_game_state_marker(reader)?)
      }
      (Scope::Roster, "avatar") => Record::Participant(decode_participant(reader)?),
      (Scope::Round, "talk") => Record::Utterance(decode_utterance(reader)?),
      (Scope::Round, event) if EVENT_ELEMENTS.contains(&event) => {
        Record::Event(decode_event(reader)?)
      }
      (_, other) => {
        trace!(element = %other, offset = reader.offset(), "skipping unknown element");
        reader.skip_subtree()?;
        return Ok(None);
      }
    };
    Ok(Some(record))
  }
}
