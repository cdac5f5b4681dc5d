//! The story graph: rounds of entries plus the participant roster.
//!
//! A [`Story`] is only produced by [`StoryBuilder`](crate::StoryBuilder) and
//! is immutable afterwards. Entries refer to participants by identifier;
//! [`Story::participant`] resolves them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  entry::{Entry, Faction},
  participant::{Participant, ParticipantId, Status},
};

// ─── Rounds ──────────────────────────────────────────────────────────────────

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
pub enum RoundKind {
  Opening,
  InProgress,
  Closing,
}

#[derive(Debug, Clone, Serialize)]
pub struct Round {
  index:   u32,
  kind:    RoundKind,
  entries: Vec<Entry>,
}

impl Round {
  pub(crate) fn new(index: u32, kind: RoundKind) -> Self {
    Self {
      index,
      kind,
      entries: Vec::new(),
    }
  }

  pub(crate) fn push(&mut self, entry: Entry) { self.entries.push(entry); }

  pub fn index(&self) -> u32 { self.index }

  pub fn kind(&self) -> RoundKind { self.kind }

  /// Entries in transcript order.
  pub fn entries(&self) -> &[Entry] { &self.entries }
}

// ─── Story ───────────────────────────────────────────────────────────────────

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
pub enum GameState {
  InProgress,
  Concluded,
}

#[derive(Debug, Clone, Serialize)]
pub struct Story {
  pub(crate) title:        String,
  pub(crate) state:        GameState,
  pub(crate) winner:       Option<Faction>,
  pub(crate) participants: Vec<Participant>,
  #[serde(skip)]
  pub(crate) index:        HashMap<ParticipantId, usize>,
  pub(crate) rounds:       Vec<Round>,
}

impl Story {
  pub fn title(&self) -> &str { &self.title }

  pub fn state(&self) -> GameState { self.state }

  /// Winning faction from the final game-state marker.
  pub fn winner(&self) -> Option<Faction> { self.winner }

  /// Rounds in ordinal order; `rounds()[i].index() == i`.
  pub fn rounds(&self) -> &[Round] { &self.rounds }

  pub fn round(&self, index: u32) -> Option<&Round> {
    self.rounds.get(usize::try_from(index).ok()?)
  }

  /// Participants in order of first appearance.
  pub fn participants(&self) -> &[Participant] { &self.participants }

  pub fn participant(&self, id: &str) -> Option<&Participant> {
    self.index.get(id).map(|&slot| &self.participants[slot])
  }

  /// Status of `id` as of round `round`, or `None` for an unknown id.
  pub fn status_of(&self, id: &str, round: u32) -> Option<Status> {
    self.participant(id).map(|p| p.status_at(round))
  }

  /// Every entry of every round, in transcript order.
  pub fn entries(&self) -> impl Iterator<Item = &Entry> {
    self.rounds.iter().flat_map(|r| r.entries.iter())
  }

  pub fn entry_count(&self) -> usize {
    self.rounds.iter().map(|r| r.entries.len()).sum()
  }
}
