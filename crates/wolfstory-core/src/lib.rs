//! Domain model for archived werewolf-game transcripts.
//!
//! Holds the story graph (participants, rounds, entries), the decoded record
//! types that feed it, the single-pass [`StoryBuilder`](builder::StoryBuilder)
//! that enforces cross-record invariants, and the filter engine.
//!
//! This crate is free of XML and I/O; `wolfstory-xml` turns transcripts into
//! [`Record`](record::Record)s and drives the builder.

pub mod builder;
pub mod entry;
pub mod error;
pub mod filter;
pub mod participant;
pub mod record;
pub mod story;
pub mod time;

pub use builder::StoryBuilder;
pub use error::{Error, Position, Result};
pub use filter::{FilterSpec, FilteredRound, FilteredView, apply_filter};
pub use story::Story;
