//! Filtered, read-only views over a [`Story`].
//!
//! A [`FilterSpec`] constrains entries along two dimensions: kind (utterance
//! kind or event category, depending on the entry variant) and participant
//! (speaker, or any participant an event names). Dimensions combine with
//! AND; values inside a dimension combine with OR. An unset dimension
//! imposes nothing.
//!
//! [`apply_filter`] is O(1): the view holds the story by reference and
//! matches entries only while being iterated.

use std::collections::HashSet;

use crate::{
  entry::{Entry, EventCategory, UtteranceKind},
  participant::ParticipantId,
  story::{Round, RoundKind, Story},
};

// ─── Spec ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
  /// Allowed utterance kinds.
  pub utterance_kinds:  Option<HashSet<UtteranceKind>>,
  /// Allowed narrative-event categories.
  pub event_categories: Option<HashSet<EventCategory>>,
  /// Allowed speakers and event subjects.
  pub participants:     Option<HashSet<ParticipantId>>,
}

impl FilterSpec {
  pub fn new() -> Self { Self::default() }

  pub fn with_utterance_kinds(
    mut self,
    kinds: impl IntoIterator<Item = UtteranceKind>,
  ) -> Self {
    self.utterance_kinds = Some(kinds.into_iter().collect());
    self
  }

  pub fn with_event_categories(
    mut self,
    categories: impl IntoIterator<Item = EventCategory>,
  ) -> Self {
    self.event_categories = Some(categories.into_iter().collect());
    self
  }

  pub fn with_participants<I, P>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<ParticipantId>,
  {
    self.participants = Some(ids.into_iter().map(Into::into).collect());
    self
  }

  /// True when no dimension is set; such a spec matches every entry.
  pub fn is_empty(&self) -> bool {
    self.utterance_kinds.is_none()
      && self.event_categories.is_none()
      && self.participants.is_none()
  }

  pub fn matches(&self, entry: &Entry) -> bool {
    self.matches_kind(entry) && self.matches_participant(entry)
  }

  /// The kind dimension is active once either kind set is present. A missing
  /// set then admits nothing of its variant.
  fn matches_kind(&self, entry: &Entry) -> bool {
    if self.utterance_kinds.is_none() && self.event_categories.is_none() {
      return true;
    }
    match entry {
      Entry::Utterance(u) => self
        .utterance_kinds
        .as_ref()
        .is_some_and(|kinds| kinds.contains(&u.kind)),
      Entry::Event(e) => self
        .event_categories
        .as_ref()
        .is_some_and(|categories| categories.contains(&e.category())),
    }
  }

  fn matches_participant(&self, entry: &Entry) -> bool {
    let Some(allowed) = &self.participants else {
      return true;
    };
    entry.participants().into_iter().any(|id| allowed.contains(id))
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// Build a view of `story` restricted by `spec`.
pub fn apply_filter(story: &Story, spec: FilterSpec) -> FilteredView<'_> {
  FilteredView { story, spec }
}

#[derive(Debug, Clone)]
pub struct FilteredView<'s> {
  story: &'s Story,
  spec:  FilterSpec,
}

impl<'s> FilteredView<'s> {
  pub fn story(&self) -> &'s Story { self.story }

  pub fn spec(&self) -> &FilterSpec { &self.spec }

  /// Every round of the story, including rounds with no matching entry.
  pub fn rounds(&self) -> impl Iterator<Item = FilteredRound<'_>> {
    let spec = &self.spec;
    self
      .story
      .rounds()
      .iter()
      .map(move |round| FilteredRound { round, spec })
  }

  /// Matching entries across all rounds, in transcript order.
  pub fn entries(&self) -> impl Iterator<Item = &Entry> {
    let spec = &self.spec;
    self.story.entries().filter(move |e| spec.matches(e))
  }

  pub fn count(&self) -> usize { self.entries().count() }
}

/// One round seen through a filter.
#[derive(Debug, Clone, Copy)]
pub struct FilteredRound<'v> {
  round: &'v Round,
  spec:  &'v FilterSpec,
}

impl<'v> FilteredRound<'v> {
  pub fn index(&self) -> u32 { self.round.index() }

  pub fn kind(&self) -> RoundKind { self.round.kind() }

  pub fn round(&self) -> &'v Round { self.round }

  pub fn entries(self) -> impl Iterator<Item = &'v Entry> {
    let spec = self.spec;
    self.round.entries().iter().filter(move |e| spec.matches(e))
  }

  pub fn is_empty(self) -> bool { self.entries().next().is_none() }
}
