//! Single-pass story assembly.
//!
//! [`StoryBuilder`] consumes decoded [`Record`]s in transcript order and
//! enforces what no single record can check alone: contiguous round
//! ordinals, roster resolution for every participant reference, and the
//! no-resurrection rule for status changes.
//!
//! `push` and `finish` take the builder by value. A failed push drops the
//! builder, so no partial story ever escapes.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
  entry::{Entry, EventPayload, NarrativeEvent, Utterance},
  error::{Error, Position, Result},
  participant::{Participant, ParticipantId},
  record::{GameStateRecord, ParticipantRecord, Record, RoundRecord},
  story::{Round, Story},
};

#[derive(Debug, Default)]
pub struct StoryBuilder {
  title:        Option<String>,
  participants: Vec<Participant>,
  index:        HashMap<ParticipantId, usize>,
  closed:       Vec<Round>,
  open:         Option<Round>,
  game_state:   Option<GameStateRecord>,
}

impl StoryBuilder {
  pub fn new() -> Self { Self::default() }

  /// Feed the next record. `offset` is the record's byte offset in the
  /// transcript and ends up in any error.
  pub fn push(mut self, record: Record, offset: u64) -> Result<Self> {
    match record {
      Record::Header(header) => self.title = Some(header.title),
      Record::Participant(p) => self.merge_participant(p, offset)?,
      Record::Round(r) => self.open_round(r, offset)?,
      Record::Utterance(u) => self.append_utterance(u, offset)?,
      Record::Event(e) => self.append_event(e, offset)?,
      Record::GameState(g) => {
        if self.game_state.is_some() {
          debug!(offset, "game state marker repeated; keeping the last one");
        }
        self.game_state = Some(g);
      }
    }
    Ok(self)
  }

  /// Close the last round and freeze the story. `offset` is the end of the
  /// transcript.
  pub fn finish(self, offset: u64) -> Result<Story> {
    let position = self.position(offset);
    let StoryBuilder {
      title,
      participants,
      index,
      mut closed,
      open,
      game_state,
    } = self;

    if let Some(last) = open {
      debug!(round = last.index(), entries = last.entries().len(), "round closed");
      closed.push(last);
    }

    let Some(title) = title else {
      return Err(Error::IncompleteStory {
        reason: "missing story header",
        position,
      });
    };
    if closed.is_empty() {
      return Err(Error::IncompleteStory {
        reason: "no round was ever opened",
        position,
      });
    }
    let Some(game_state) = game_state else {
      return Err(Error::IncompleteStory {
        reason: "missing final game state marker",
        position,
      });
    };

    debug!(
      rounds = closed.len(),
      participants = participants.len(),
      state = %game_state.state,
      "story complete"
    );

    Ok(Story {
      title,
      state: game_state.state,
      winner: game_state.winner,
      participants,
      index,
      rounds: closed,
    })
  }

  // ── Records ─────────────────────────────────────────────────────────────

  fn merge_participant(
    &mut self,
    record: ParticipantRecord,
    offset: u64,
  ) -> Result<()> {
    if let Some(&slot) = self.index.get(&record.id) {
      if self.participants[slot].conflicts_with(&record) {
        return Err(Error::DuplicateParticipant {
          id:       record.id,
          position: self.position(offset),
        });
      }
      trace!(id = %record.id, "participant redeclared identically");
      return Ok(());
    }

    trace!(id = %record.id, "participant added");
    self.index.insert(record.id.clone(), self.participants.len());
    self.participants.push(Participant::new(record));
    Ok(())
  }

  fn open_round(&mut self, record: RoundRecord, offset: u64) -> Result<()> {
    let expected = self.round_count();
    if record.index != expected {
      return Err(Error::RoundOrder {
        expected,
        found: record.index,
        position: self.position(offset),
      });
    }

    if let Some(done) = self.open.take() {
      debug!(round = done.index(), entries = done.entries().len(), "round closed");
      self.closed.push(done);
    }
    debug!(round = record.index, kind = %record.kind, "round opened");
    self.open = Some(Round::new(record.index, record.kind));
    Ok(())
  }

  fn append_utterance(&mut self, utterance: Utterance, offset: u64) -> Result<()> {
    let position = self.position(offset);
    self.open_round_index(position)?;
    self.resolve(&utterance.speaker, position)?;
    self.push_entry(Entry::Utterance(utterance));
    Ok(())
  }

  fn append_event(&mut self, event: NarrativeEvent, offset: u64) -> Result<()> {
    let position = self.position(offset);
    let round = self.open_round_index(position)?;

    if let EventPayload::Arrival {
      participant,
      name: Some(name),
      avatar,
      ..
    } = &event.payload
    {
      self.merge_participant(
        ParticipantRecord {
          id:     participant.clone(),
          name:   name.clone(),
          avatar: avatar.clone(),
        },
        offset,
      )?;
    }

    for id in event.payload.participants() {
      self.resolve(id, position)?;
    }

    for (id, status) in event.payload.status_assertions() {
      let slot = self.resolve(id, position)?;
      self.participants[slot]
        .record_status(round, status)
        .map_err(|from| Error::IllegalStatusTransition {
          id: id.clone(),
          from,
          to: status,
          position,
        })?;
      trace!(%id, round, %status, "status recorded");
    }

    self.push_entry(Entry::Event(event));
    Ok(())
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  fn round_count(&self) -> u32 {
    let count = self.closed.len() + usize::from(self.open.is_some());
    u32::try_from(count).unwrap_or(u32::MAX)
  }

  fn position(&self, offset: u64) -> Position {
    Position {
      offset,
      round: self.open.as_ref().map(Round::index),
      entry: self.open.as_ref().map(|r| r.entries().len()),
    }
  }

  fn open_round_index(&self, position: Position) -> Result<u32> {
    self
      .open
      .as_ref()
      .map(Round::index)
      .ok_or(Error::OrphanEntry { position })
  }

  fn resolve(&self, id: &ParticipantId, position: Position) -> Result<usize> {
    self
      .index
      .get(id)
      .copied()
      .ok_or_else(|| Error::UnknownParticipant {
        id: id.clone(),
        position,
      })
  }

  fn push_entry(&mut self, entry: Entry) {
    if let Some(round) = self.open.as_mut() {
      round.push(entry);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entry::{EliminationCause, Line, UtteranceKind, VoteCount},
    participant::Status,
    record::HeaderRecord,
    story::{GameState, RoundKind},
  };

  fn header() -> Record {
    Record::Header(HeaderRecord {
      title: "Test Village".into(),
    })
  }

  fn member(id: &str) -> Record {
    Record::Participant(ParticipantRecord {
      id:     id.into(),
      name:   format!("Player {id}"),
      avatar: None,
    })
  }

  fn round(index: u32) -> Record {
    Record::Round(RoundRecord {
      index,
      kind: if index == 0 {
        RoundKind::Opening
      } else {
        RoundKind::InProgress
      },
    })
  }

  fn say(speaker: &str, text: &str) -> Record {
    let mut u = Utterance::new(speaker, UtteranceKind::Public);
    u.lines.push(Line::text(text));
    Record::Utterance(u)
  }

  fn execute(victim: &str) -> Record {
    Record::Event(NarrativeEvent::new(EventPayload::Elimination {
      cause:   EliminationCause::Execution,
      victims: vec![victim.into()],
      tallies: vec![VoteCount {
        participant: victim.into(),
        count:       2,
      }],
    }))
  }

  fn concluded() -> Record {
    Record::GameState(GameStateRecord {
      state:  GameState::Concluded,
      winner: None,
    })
  }

  fn build(records: Vec<Record>) -> Result<Story> {
    let mut builder = StoryBuilder::new();
    for (offset, record) in records.into_iter().enumerate() {
      builder = builder.push(record, offset as u64)?;
    }
    builder.finish(u64::MAX)
  }

  #[test]
  fn builds_rounds_in_order() {
    let story = build(vec![
      header(),
      member("a"),
      member("b"),
      round(0),
      say("a", "hello"),
      say("b", "hi"),
      round(1),
      execute("b"),
      say("a", "sorry"),
      concluded(),
    ])
    .unwrap();

    assert_eq!(story.title(), "Test Village");
    assert_eq!(story.state(), GameState::Concluded);
    assert_eq!(story.rounds().len(), 2);
    assert_eq!(story.rounds()[0].entries().len(), 2);
    assert_eq!(story.rounds()[1].entries().len(), 2);
    assert_eq!(story.entry_count(), 4);
    assert_eq!(story.status_of("b", 0), Some(Status::Alive));
    assert_eq!(story.status_of("b", 1), Some(Status::Executed));
    assert_eq!(story.status_of("a", 1), Some(Status::Alive));
    assert_eq!(story.status_of("zz", 1), None);
  }

  #[test]
  fn skipped_ordinal_is_round_order_error() {
    let err = build(vec![header(), round(0), round(2), concluded()]).unwrap_err();
    let Error::RoundOrder {
      expected,
      found,
      position,
    } = err
    else {
      panic!("expected RoundOrder, got {err:?}")
    };
    assert_eq!((expected, found), (1, 2));
    assert_eq!(position.offset, 2);
  }

  #[test]
  fn first_round_must_be_zero() {
    let err = build(vec![header(), round(1), concluded()]).unwrap_err();
    assert!(matches!(err, Error::RoundOrder { expected: 0, found: 1, .. }));
  }

  #[test]
  fn unknown_speaker_rejected() {
    let err = build(vec![header(), member("a"), round(0), say("c", "boo")])
      .unwrap_err();
    let Error::UnknownParticipant { id, position } = err else {
      panic!("expected UnknownParticipant, got {err:?}")
    };
    assert_eq!(id.as_str(), "c");
    assert_eq!(position.round, Some(0));
    assert_eq!(position.entry, Some(0));
  }

  #[test]
  fn resurrection_rejected() {
    let survival = Record::Event(NarrativeEvent::new(EventPayload::Survival {
      survivors: vec!["b".into()],
    }));
    let err = build(vec![
      header(),
      member("b"),
      round(0),
      execute("b"),
      round(1),
      survival,
    ])
    .unwrap_err();
    assert!(matches!(
      err,
      Error::IllegalStatusTransition {
        from: Status::Executed,
        to: Status::Alive,
        ..
      }
    ));
  }

  #[test]
  fn duplicate_roster_entries() {
    let story = build(vec![
      header(),
      member("a"),
      member("a"),
      round(0),
      concluded(),
    ])
    .unwrap();
    assert_eq!(story.participants().len(), 1);

    let conflicting = Record::Participant(ParticipantRecord {
      id:     "a".into(),
      name:   "Somebody Else".into(),
      avatar: None,
    });
    let err = build(vec![header(), member("a"), conflicting]).unwrap_err();
    assert!(matches!(err, Error::DuplicateParticipant { .. }));
  }

  #[test]
  fn arrival_with_name_introduces_participant() {
    let arrival = Record::Event(NarrativeEvent::new(EventPayload::Arrival {
      participant: "d".into(),
      entry_no:    Some(1),
      name:        Some("Dora".into()),
      avatar:      None,
    }));
    let story = build(vec![
      header(),
      round(0),
      arrival,
      say("d", "hello"),
      concluded(),
    ])
    .unwrap();
    assert_eq!(story.participant("d").unwrap().name(), "Dora");
  }

  #[test]
  fn entry_before_round_is_orphan() {
    let err = build(vec![header(), member("a"), say("a", "early")]).unwrap_err();
    assert!(matches!(err, Error::OrphanEntry { .. }));
  }

  #[test]
  fn incomplete_stories() {
    let err = build(vec![header(), member("a")]).unwrap_err();
    assert!(matches!(err, Error::IncompleteStory { .. }));

    let err = build(vec![header(), round(0)]).unwrap_err();
    let Error::IncompleteStory { reason, .. } = err else {
      panic!("expected IncompleteStory")
    };
    assert!(reason.contains("game state"));

    let err = build(vec![round(0), concluded()]).unwrap_err();
    assert!(matches!(err, Error::IncompleteStory { .. }));
  }
}
