//! Decoded transcript records, in the order the builder consumes them.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  entry::{Faction, NarrativeEvent, Utterance},
  participant::ParticipantId,
  story::{GameState, RoundKind},
};

/// Story-level metadata from the transcript root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
  pub title: String,
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
  pub id:     ParticipantId,
  pub name:   String,
  pub avatar: Option<String>,
}

/// A round boundary: everything up to the next boundary belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
  pub index: u32,
  pub kind:  RoundKind,
}

/// The final game-state marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateRecord {
  pub state:  GameState,
  pub winner: Option<Faction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
  Header(HeaderRecord),
  Participant(ParticipantRecord),
  Round(RoundRecord),
  Utterance(Utterance),
  Event(NarrativeEvent),
  GameState(GameStateRecord),
}

impl Record {
  pub fn kind(&self) -> RecordKind {
    match self {
      Self::Header(_) => RecordKind::Header,
      Self::Participant(_) => RecordKind::Participant,
      Self::Round(_) => RecordKind::Round,
      Self::Utterance(_) => RecordKind::Utterance,
      Self::Event(_) => RecordKind::Event,
      Self::GameState(_) => RecordKind::GameState,
    }
  }
}

/// Record kinds, plus `Line` for body lines decoded inside other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
  Header,
  Participant,
  Round,
  Utterance,
  Event,
  Line,
  GameState,
}
