//! Error types for the wolfstory-xml decoder.

use thiserror::Error;
use wolfstory_core::{Position, record::RecordKind};

#[derive(Debug, Error)]
pub enum Error {
  /// The cursor's structural precondition was violated, or the XML itself
  /// is malformed.
  #[error("malformed transcript structure at {position}: {detail}")]
  Structure { position: Position, detail: String },

  /// A record's required field is missing or lexically invalid.
  #[error("cannot decode {kind} record at {position}: {detail}")]
  Decode {
    kind:     RecordKind,
    position: Position,
    detail:   String,
  },

  #[error(transparent)]
  Story(#[from] wolfstory_core::Error),
}

impl Error {
  pub(crate) fn structure(offset: u64, detail: impl Into<String>) -> Self {
    Self::Structure {
      position: Position::at(offset),
      detail:   detail.into(),
    }
  }

  pub(crate) fn decode(
    kind: RecordKind,
    offset: u64,
    detail: impl Into<String>,
  ) -> Self {
    Self::Decode {
      kind,
      position: Position::at(offset),
      detail: detail.into(),
    }
  }

  /// Fill in the round and entry ordinals of a decoder-side error. Errors
  /// from the story builder already carry their own.
  pub(crate) fn locate(mut self, round: Option<u32>, entry: Option<usize>) -> Self {
    if let Self::Structure { position, .. } | Self::Decode { position, .. } =
      &mut self
    {
      position.round = position.round.or(round);
      position.entry = position.entry.or(entry);
    }
    self
  }

  pub fn position(&self) -> Position {
    match self {
      Self::Structure { position, .. } | Self::Decode { position, .. } => {
        *position
      }
      Self::Story(e) => e.position(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
