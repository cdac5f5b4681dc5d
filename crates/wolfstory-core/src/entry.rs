//! Round entries: utterances and narrative events.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  participant::{ParticipantId, Status},
  time::TimeOfDay,
};

// ─── Body text ───────────────────────────────────────────────────────────────

/// A run inside a body line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
  Text { text: String },
  Link { href: String, label: String },
}

/// One body line. Segments keep their transcript order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
  pub segments: Vec<Segment>,
}

impl Line {
  /// A line holding a single plain-text run.
  pub fn text(text: impl Into<String>) -> Self {
    Self {
      segments: vec![Segment::Text { text: text.into() }],
    }
  }

  pub fn is_empty(&self) -> bool { self.segments.is_empty() }

  /// The line as it reads on screen, link labels inline.
  pub fn plain_text(&self) -> String {
    self
      .segments
      .iter()
      .map(|s| match s {
        Segment::Text { text } => text.as_str(),
        Segment::Link { label, .. } => label.as_str(),
      })
      .collect()
  }
}

// ─── Utterances ──────────────────────────────────────────────────────────────

/// Audience of an utterance.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UtteranceKind {
  /// Heard by everyone.
  Public,
  /// Heard only by the speaker's faction.
  Faction,
  /// Addressed to nobody or a single target.
  Private,
  /// Spoken by the dead among the dead.
  Posthumous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
  pub speaker:    ParticipantId,
  pub kind:       UtteranceKind,
  pub lines:      Vec<Line>,
  pub time:       Option<TimeOfDay>,
  /// Archive-assigned message identifier, when present.
  pub message_id: Option<String>,
  /// Per-kind sequence number shown by the archive.
  pub number:     Option<u32>,
}

impl Utterance {
  pub fn new(speaker: impl Into<ParticipantId>, kind: UtteranceKind) -> Self {
    Self {
      speaker: speaker.into(),
      kind,
      lines: Vec::new(),
      time: None,
      message_id: None,
      number: None,
    }
  }
}

// ─── Narrative events ────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventCategory {
  Announcement,
  Arrival,
  VoteTally,
  Elimination,
  Departure,
  Survival,
  GameOver,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EliminationCause {
  /// Removed by the day's vote.
  Execution,
  /// Attacked during the night.
  Assault,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Faction {
  Village,
  Wolf,
  Hamster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub voter:  ParticipantId,
  pub target: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
  pub participant: ParticipantId,
  pub count:       u32,
}

/// Category-specific structured payload of a narrative event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum EventPayload {
  Announcement,
  Arrival {
    participant: ParticipantId,
    entry_no:    Option<u32>,
    /// When set, the arrival introduces the participant to the roster.
    name:        Option<String>,
    avatar:      Option<String>,
  },
  VoteTally {
    votes: Vec<Vote>,
  },
  Elimination {
    cause:   EliminationCause,
    victims: Vec<ParticipantId>,
    tallies: Vec<VoteCount>,
  },
  Departure {
    participant: ParticipantId,
  },
  Survival {
    survivors: Vec<ParticipantId>,
  },
  GameOver {
    winner: Option<Faction>,
  },
}

impl EventPayload {
  pub fn category(&self) -> EventCategory {
    match self {
      Self::Announcement => EventCategory::Announcement,
      Self::Arrival { .. } => EventCategory::Arrival,
      Self::VoteTally { .. } => EventCategory::VoteTally,
      Self::Elimination { .. } => EventCategory::Elimination,
      Self::Departure { .. } => EventCategory::Departure,
      Self::Survival { .. } => EventCategory::Survival,
      Self::GameOver { .. } => EventCategory::GameOver,
    }
  }

  /// Every participant the payload names, in payload order.
  pub fn participants(&self) -> Vec<&ParticipantId> {
    match self {
      Self::Announcement | Self::GameOver { .. } => Vec::new(),
      Self::Arrival { participant, .. } | Self::Departure { participant } => {
        vec![participant]
      }
      Self::VoteTally { votes } => votes
        .iter()
        .flat_map(|v| [&v.voter, &v.target])
        .collect(),
      Self::Elimination {
        victims, tallies, ..
      } => victims
        .iter()
        .chain(tallies.iter().map(|t| &t.participant))
        .collect(),
      Self::Survival { survivors } => survivors.iter().collect(),
    }
  }

  /// Status changes this event asserts. Only these ever move a
  /// participant's status.
  pub fn status_assertions(&self) -> Vec<(&ParticipantId, Status)> {
    match self {
      Self::Elimination { cause, victims, .. } => {
        let status = match cause {
          EliminationCause::Execution => Status::Executed,
          EliminationCause::Assault => Status::Killed,
        };
        victims.iter().map(|v| (v, status)).collect()
      }
      Self::Departure { participant } => vec![(participant, Status::Departed)],
      Self::Survival { survivors } => {
        survivors.iter().map(|s| (s, Status::Alive)).collect()
      }
      _ => Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeEvent {
  pub payload: EventPayload,
  pub lines:   Vec<Line>,
}

impl NarrativeEvent {
  pub fn new(payload: EventPayload) -> Self {
    Self {
      payload,
      lines: Vec::new(),
    }
  }

  pub fn category(&self) -> EventCategory { self.payload.category() }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum Entry {
  Utterance(Utterance),
  Event(NarrativeEvent),
}

impl Entry {
  pub fn lines(&self) -> &[Line] {
    match self {
      Self::Utterance(u) => &u.lines,
      Self::Event(e) => &e.lines,
    }
  }

  pub fn utterance_kind(&self) -> Option<UtteranceKind> {
    match self {
      Self::Utterance(u) => Some(u.kind),
      Self::Event(_) => None,
    }
  }

  pub fn event_category(&self) -> Option<EventCategory> {
    match self {
      Self::Utterance(_) => None,
      Self::Event(e) => Some(e.category()),
    }
  }

  /// The speaker of an utterance, or the participants an event names.
  pub fn participants(&self) -> Vec<&ParticipantId> {
    match self {
      Self::Utterance(u) => vec![&u.speaker],
      Self::Event(e) => e.payload.participants(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_inlines_link_labels() {
    let line = Line {
      segments: vec![
        Segment::Text {
          text: "see ".into(),
        },
        Segment::Link {
          href:  "https://example.com/".into(),
          label: "here".into(),
        },
        Segment::Text { text: "!".into() },
      ],
    };
    assert_eq!(line.plain_text(), "see here!");
  }

  #[test]
  fn elimination_asserts_by_cause() {
    let executed = EventPayload::Elimination {
      cause:   EliminationCause::Execution,
      victims: vec!["b".into()],
      tallies: vec![VoteCount {
        participant: "b".into(),
        count:       3,
      }],
    };
    assert_eq!(executed.status_assertions(), vec![(
      &ParticipantId::from("b"),
      Status::Executed
    )]);

    let no_murder = EventPayload::Elimination {
      cause:   EliminationCause::Assault,
      victims: vec![],
      tallies: vec![],
    };
    assert!(no_murder.status_assertions().is_empty());
  }

  #[test]
  fn vote_tally_names_voters_and_targets() {
    let tally = EventPayload::VoteTally {
      votes: vec![Vote {
        voter:  "a".into(),
        target: "b".into(),
      }],
    };
    let names: Vec<&str> =
      tally.participants().into_iter().map(|p| p.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert!(tally.status_assertions().is_empty());
  }

  #[test]
  fn entry_serialises_with_tags() {
    let entry = Entry::Event(NarrativeEvent::new(EventPayload::GameOver {
      winner: Some(Faction::Wolf),
    }));
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["entry"], "event");
    assert_eq!(json["payload"]["category"], "game_over");
    assert_eq!(json["payload"]["winner"], "wolf");
  }
}
