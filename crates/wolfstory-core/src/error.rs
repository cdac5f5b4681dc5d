//! Error types for `wolfstory-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::participant::{ParticipantId, Status};

/// Where in the transcript an error was detected.
///
/// `offset` is the byte offset of the originating record. `round` and
/// `entry` are the round ordinal and entry ordinal the builder had reached,
/// when it had reached any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
  pub offset: u64,
  pub round:  Option<u32>,
  pub entry:  Option<usize>,
}

impl Position {
  pub fn at(offset: u64) -> Self {
    Self {
      offset,
      ..Self::default()
    }
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "byte {}", self.offset)?;
    match (self.round, self.entry) {
      (Some(round), Some(entry)) => write!(f, " (round {round}, entry {entry})"),
      (Some(round), None) => write!(f, " (round {round})"),
      _ => Ok(()),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("participant {id} redeclared with conflicting attributes at {position}")]
  DuplicateParticipant {
    id:       ParticipantId,
    position: Position,
  },

  #[error("round {found} declared where round {expected} was expected at {position}")]
  RoundOrder {
    expected: u32,
    found:    u32,
    position: Position,
  },

  #[error("unknown participant {id} at {position}")]
  UnknownParticipant {
    id:       ParticipantId,
    position: Position,
  },

  #[error("participant {id} cannot change from {from} to {to} at {position}")]
  IllegalStatusTransition {
    id:       ParticipantId,
    from:     Status,
    to:       Status,
    position: Position,
  },

  #[error("incomplete story: {reason} at {position}")]
  IncompleteStory {
    reason:   &'static str,
    position: Position,
  },

  #[error("entry appears before any round boundary at {position}")]
  OrphanEntry { position: Position },
}

impl Error {
  pub fn position(&self) -> Position {
    match self {
      Self::DuplicateParticipant { position, .. }
      | Self::RoundOrder { position, .. }
      | Self::UnknownParticipant { position, .. }
      | Self::IllegalStatusTransition { position, .. }
      | Self::IncompleteStory { position, .. }
      | Self::OrphanEntry { position } => *position,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
