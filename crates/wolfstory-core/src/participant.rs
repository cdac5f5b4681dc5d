//! Participants and their per-round status history.
//!
//! A participant is created once, from the roster or from an arrival event,
//! and never removed. Its name and avatar never change afterwards; only the
//! status history grows, and only through narrative events.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::record::ParticipantRecord;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Roster-unique participant identifier, as written in the transcript.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for ParticipantId {
  fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl From<String> for ParticipantId {
  fn from(id: String) -> Self { Self(id) }
}

impl Borrow<str> for ParticipantId {
  fn borrow(&self) -> &str { &self.0 }
}

impl fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Life status of a participant.
///
/// `Alive` precedes every other value. The three terminal values are
/// mutually unreachable: nobody is executed after being killed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
  #[default]
  Alive,
  Executed,
  Killed,
  Departed,
}

impl Status {
  pub fn is_alive(self) -> bool { matches!(self, Self::Alive) }

  /// Position in the status order. Later statuses have a higher rank.
  pub fn rank(self) -> u8 {
    match self {
      Self::Alive => 0,
      Self::Executed | Self::Killed | Self::Departed => 1,
    }
  }

  /// Whitelisted transitions. Anything not listed is illegal.
  pub fn can_transition_to(self, next: Status) -> bool {
    matches!(
      (self, next),
      (Self::Alive, Self::Alive)
        | (Self::Alive, Self::Executed)
        | (Self::Alive, Self::Killed)
        | (Self::Alive, Self::Departed)
    )
  }
}

/// One status assertion: from `round` onwards the participant is `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub round:  u32,
  pub status: Status,
}

// ─── Participant ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
  id:      ParticipantId,
  name:    String,
  avatar:  Option<String>,
  history: Vec<StatusChange>,
}

impl Participant {
  pub(crate) fn new(record: ParticipantRecord) -> Self {
    Self {
      id:      record.id,
      name:    record.name,
      avatar:  record.avatar,
      history: Vec::new(),
    }
  }

  pub fn id(&self) -> &ParticipantId { &self.id }

  pub fn name(&self) -> &str { &self.name }

  /// Opaque avatar image URI; resolving it is up to the caller.
  pub fn avatar(&self) -> Option<&str> { self.avatar.as_deref() }

  /// Status assertions in the order they were recorded.
  pub fn history(&self) -> &[StatusChange] { &self.history }

  pub fn current_status(&self) -> Status {
    self.history.last().map_or(Status::Alive, |c| c.status)
  }

  /// Status as of round `round`.
  pub fn status_at(&self, round: u32) -> Status {
    self
      .history
      .iter()
      .take_while(|c| c.round <= round)
      .last()
      .map_or(Status::Alive, |c| c.status)
  }

  /// True when `record` states an attribute that differs from ours. Absent
  /// attributes impose nothing.
  pub(crate) fn conflicts_with(&self, record: &ParticipantRecord) -> bool {
    record.name != self.name
      || record
        .avatar
        .as_ref()
        .is_some_and(|a| self.avatar.as_ref() != Some(a))
  }

  /// Append a status assertion, returning the current status on an illegal
  /// transition.
  pub(crate) fn record_status(
    &mut self,
    round: u32,
    status: Status,
  ) -> Result<(), Status> {
    let current = self.current_status();
    if !current.can_transition_to(status) {
      return Err(current);
    }
    self.history.push(StatusChange { round, status });
    Ok(())
  }
}
