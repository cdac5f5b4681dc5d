//! XML transcript decoder for wolfstory.
//!
//! Streams an archived village transcript through a forward-only cursor,
//! decodes each element into a [`wolfstory_core::record::Record`] and feeds
//! the records to a [`StoryBuilder`]. Pure synchronous; the whole document
//! is never held in memory.
//!
//! # Quick start
//!
//! ```no_run
//! let xml = std::fs::read_to_string("village.xml").unwrap();
//! let story = wolfstory_xml::parse(&xml).unwrap();
//! println!("{}: {} rounds", story.title(), story.rounds().len());
//! ```

pub mod decode;
pub mod error;
pub mod reader;
pub mod scalar;


use std::io::BufRead;

pub use decode::RecordStream;
pub use error::{Error, Result};
pub use reader::{NodeKind, TranscriptReader};
use tracing::debug;
use wolfstory_core::{Story, StoryBuilder};

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Build a story from a cursor positioned at the start of a transcript.
///
/// The first error ends the build; no partial story is returned.
pub fn build_story<R: BufRead>(reader: TranscriptReader<R>) -> Result<Story> {
  let mut records = RecordStream::new(reader);
  let mut builder = StoryBuilder::new();
  let mut count = 0usize;

  while let Some((record, offset)) = records.next_record()? {
    builder = builder.push(record, offset)?;
    count += 1;
  }

  let story = builder.finish(records.offset())?;
  debug!(
    records = count,
    rounds = story.rounds().len(),
    participants = story.participants().len(),
    "transcript decoded"
  );
  Ok(story)
}

/// Parse a complete transcript held in memory.
pub fn parse(xml: &str) -> Result<Story> {
  build_story(TranscriptReader::from_bytes(xml.as_bytes())?)
}

/// Parse a transcript from any buffered source, such as a file.
pub fn from_reader<R: BufRead>(source: R) -> Result<Story> {
  build_story(TranscriptReader::new(source)?)
}
