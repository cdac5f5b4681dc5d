//! Property tests for story assembly and filtering.
//!
//! Transcripts are generated as per-round operation lists and lowered into
//! records, skipping status changes that would be illegal so every
//! generated transcript is valid.

use proptest::prelude::*;
use wolfstory_core::{
  FilterSpec, Story, StoryBuilder, apply_filter,
  entry::{
    EliminationCause, Entry, EventCategory, EventPayload, Line, NarrativeEvent,
    Utterance, UtteranceKind,
  },
  error::Error,
  participant::Status,
  record::{
    GameStateRecord, HeaderRecord, ParticipantRecord, Record, RoundRecord,
  },
  story::{GameState, RoundKind},
};

#[derive(Debug, Clone)]
enum Op {
  Say(usize, UtteranceKind),
  Eliminate(usize, EliminationCause),
  Depart(usize),
  Survive(usize),
  Announce,
}

fn utterance_kind() -> impl Strategy<Value = UtteranceKind> {
  prop_oneof![
    Just(UtteranceKind::Public),
    Just(UtteranceKind::Faction),
    Just(UtteranceKind::Private),
    Just(UtteranceKind::Posthumous),
  ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (0..8usize, utterance_kind()).prop_map(|(p, k)| Op::Say(p, k)),
    1 => (0..8usize, any::<bool>()).prop_map(|(p, vote)| {
      Op::Eliminate(p, if vote { EliminationCause::Execution } else { EliminationCause::Assault })
    }),
    1 => (0..8usize).prop_map(Op::Depart),
    1 => (0..8usize).prop_map(Op::Survive),
    1 => Just(Op::Announce),
  ]
}

fn transcript_strategy() -> impl Strategy<Value = (usize, Vec<Vec<Op>>)> {
  (
    1..6usize,
    prop::collection::vec(prop::collection::vec(op_strategy(), 0..12), 1..6),
  )
}

fn player(index: usize) -> String { format!("p{index}") }

fn event(payload: EventPayload) -> Record {
  Record::Event(NarrativeEvent::new(payload))
}

/// Lower generated operations into a valid record stream.
fn lower(players: usize, rounds: &[Vec<Op>]) -> Vec<Record> {
  let mut alive = vec![true; players];
  let mut serial = 0u32;
  let mut out = vec![Record::Header(HeaderRecord {
    title: "Generated".into(),
  })];

  for p in 0..players {
    out.push(Record::Participant(ParticipantRecord {
      id:     player(p).into(),
      name:   format!("Player {p}"),
      avatar: None,
    }));
  }

  for (index, ops) in rounds.iter().enumerate() {
    let kind = match index {
      0 => RoundKind::Opening,
      i if i + 1 == rounds.len() => RoundKind::Closing,
      _ => RoundKind::InProgress,
    };
    out.push(Record::Round(RoundRecord {
      index: index as u32,
      kind,
    }));

    for op in ops {
      let record = match *op {
        Op::Say(p, kind) => {
          serial += 1;
          let mut u = Utterance::new(player(p % players), kind);
          u.lines.push(Line::text(serial.to_string()));
          Record::Utterance(u)
        }
        Op::Eliminate(p, cause) if alive[p % players] => {
          alive[p % players] = false;
          event(EventPayload::Elimination {
            cause,
            victims: vec![player(p % players).into()],
            tallies: vec![],
          })
        }
        Op::Depart(p) if alive[p % players] => {
          alive[p % players] = false;
          event(EventPayload::Departure {
            participant: player(p % players).into(),
          })
        }
        Op::Survive(p) if alive[p % players] => event(EventPayload::Survival {
          survivors: vec![player(p % players).into()],
        }),
        _ => event(EventPayload::Announcement),
      };
      out.push(record);
    }
  }

  out.push(Record::GameState(GameStateRecord {
    state:  GameState::Concluded,
    winner: None,
  }));
  out
}

fn build(records: Vec<Record>) -> Result<Story, Error> {
  let mut builder = StoryBuilder::new();
  for (offset, record) in records.into_iter().enumerate() {
    builder = builder.push(record, offset as u64)?;
  }
  builder.finish(u64::MAX)
}

fn serials<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<String> {
  entries
    .filter_map(|e| match e {
      Entry::Utterance(u) => Some(u.lines[0].plain_text()),
      Entry::Event(_) => None,
    })
    .collect()
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(256))]

  #[test]
  fn valid_transcripts_build_with_contiguous_rounds((players, rounds) in transcript_strategy()) {
    let story = build(lower(players, &rounds)).unwrap();
    let ordinals: Vec<u32> = story.rounds().iter().map(|r| r.index()).collect();
    let expected: Vec<u32> = (0..rounds.len() as u32).collect();
    prop_assert_eq!(ordinals, expected);
  }

  #[test]
  fn status_projection_is_monotonic((players, rounds) in transcript_strategy()) {
    let story = build(lower(players, &rounds)).unwrap();
    for participant in story.participants() {
      let mut previous = Status::Alive;
      for k in 0..rounds.len() as u32 {
        let now = participant.status_at(k);
        prop_assert!(now.rank() >= previous.rank());
        if !previous.is_alive() {
          prop_assert_eq!(now, previous);
        }
        previous = now;
      }
    }
  }

  #[test]
  fn entry_order_is_document_order((players, rounds) in transcript_strategy()) {
    let records = lower(players, &rounds);
    let input: Vec<String> = records
      .iter()
      .filter_map(|r| match r {
        Record::Utterance(u) => Some(u.lines[0].plain_text()),
        _ => None,
      })
      .collect();
    let story = build(records).unwrap();
    prop_assert_eq!(serials(story.entries()), input);
  }

  #[test]
  fn empty_filter_is_identity((players, rounds) in transcript_strategy()) {
    let story = build(lower(players, &rounds)).unwrap();
    let view = apply_filter(&story, FilterSpec::new());
    prop_assert_eq!(view.count(), story.entry_count());
    prop_assert!(view.entries().eq(story.entries()));
    prop_assert_eq!(view.rounds().count(), story.rounds().len());
  }

  #[test]
  fn filtering_is_idempotent(
    (players, rounds) in transcript_strategy(),
    kinds in prop::collection::hash_set(utterance_kind(), 0..4),
    categories in prop::option::of(prop::collection::hash_set(
      prop_oneof![
        Just(EventCategory::Announcement),
        Just(EventCategory::Elimination),
        Just(EventCategory::Departure),
        Just(EventCategory::Survival),
      ],
      0..4,
    )),
    speaker in 0..6usize,
  ) {
    let story = build(lower(players, &rounds)).unwrap();
    let mut spec = FilterSpec::new()
      .with_utterance_kinds(kinds)
      .with_participants([player(speaker)]);
    spec.event_categories = categories;

    let view = apply_filter(&story, spec.clone());
    let once: Vec<&Entry> = view.entries().collect();
    let twice: Vec<&Entry> = once.iter().copied().filter(|e| spec.matches(e)).collect();
    prop_assert_eq!(once, twice);
  }

  #[test]
  fn resurrection_always_fails((players, rounds) in transcript_strategy()) {
    let mut records = lower(players, &rounds);
    let state = records.pop();
    records.push(Record::Round(RoundRecord { index: rounds.len() as u32, kind: RoundKind::Closing }));
    records.push(event(EventPayload::Elimination {
      cause:   EliminationCause::Execution,
      victims: vec![player(0).into()],
      tallies: vec![],
    }));
    records.push(event(EventPayload::Survival { survivors: vec![player(0).into()] }));
    records.extend(state);

    let err = build(records).unwrap_err();
    prop_assert!(
      matches!(err, Error::IllegalStatusTransition { .. }),
      "expected an illegal transition, got {}",
      err
    );
  }
}

