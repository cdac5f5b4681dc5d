//! Forward-only, depth-aware cursor over a transcript's element tree.
//!
//! Wraps a streaming `quick-xml` reader. The cursor always sits on one node:
//! an element start, an element end, a text run, or end of input. Only the
//! current node is held in memory.
//!
//! Empty elements (`<li/>`) are expanded into a start immediately followed by
//! an end, so every element has the same shape. Comments, processing
//! instructions and declarations never surface. Text surfaces as-is,
//! whitespace-only runs included; callers walking structure step over it.

use std::io::BufRead;

use quick_xml::{
  Reader,
  events::{BytesStart, Event},
  name::QName,
};

use crate::error::{Error, Result};

/// What the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
  BoundaryStart,
  BoundaryEnd,
  Text,
  EndOfInput,
}

#[derive(Debug)]
enum Node {
  Start {
    element: BytesStart<'static>,
    name:    String,
  },
  End {
    name: String,
  },
  Text(String),
  Eof,
}

pub struct TranscriptReader<R> {
  reader:  Reader<R>,
  buf:     Vec<u8>,
  current: Node,
  offset:  u64,
  depth:   usize,
}

impl<'a> TranscriptReader<&'a [u8]> {
  pub fn from_bytes(xml: &'a [u8]) -> Result<Self> { Self::new(xml) }
}

impl<R: BufRead> TranscriptReader<R> {
  /// Wrap `source` and position the cursor on its first node.
  pub fn new(source: R) -> Result<Self> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().expand_empty_elements = true;

    let mut cursor = Self {
      reader,
      buf: Vec::new(),
      current: Node::Eof,
      offset: 0,
      depth: 0,
    };
    cursor.fill()?;
    Ok(cursor)
  }

  pub fn kind(&self) -> NodeKind {
    match self.current {
      Node::Start { .. } => NodeKind::BoundaryStart,
      Node::End { .. } => NodeKind::BoundaryEnd,
      Node::Text(_) => NodeKind::Text,
      Node::Eof => NodeKind::EndOfInput,
    }
  }

  /// Byte offset of the current node.
  pub fn offset(&self) -> u64 { self.offset }

  /// Number of elements entered and not yet left.
  pub fn depth(&self) -> usize { self.depth }

  /// Local (prefix-free) name of the current element boundary.
  pub fn name(&self) -> Option<&str> {
    match &self.current {
      Node::Start { name, .. } | Node::End { name } => Some(name),
      _ => None,
    }
  }

  /// True when positioned on the start of an element called `name`.
  pub fn is_start_of(&self, name: &str) -> bool {
    matches!(&self.current, Node::Start { name: n, .. } if n == name)
  }

  pub fn text(&self) -> Option<&str> {
    match &self.current {
      Node::Text(text) => Some(text),
      _ => None,
    }
  }

  /// Unescaped value of attribute `name` on the current element start.
  pub fn attr(&self, name: &str) -> Result<Option<String>> {
    let Node::Start { element, .. } = &self.current else {
      return Err(Error::structure(self.offset, "attribute read off an element start"));
    };
    let attr = element
      .try_get_attribute(name)
      .map_err(|e| Error::structure(self.offset, e.to_string()))?;
    attr
      .map(|a| {
        a.unescape_value()
          .map(|v| v.into_owned())
          .map_err(|e| Error::structure(self.offset, e.to_string()))
      })
      .transpose()
  }

  /// Enter the current element: the cursor moves to its first child, or to
  /// its end boundary when it has no children.
  pub fn descend(&mut self) -> Result<()> {
    if !matches!(self.current, Node::Start { .. }) {
      return Err(Error::structure(self.offset, "descend on a node without children"));
    }
    self.depth += 1;
    self.fill()
  }

  /// Move to the next sibling. On an element start this skips the element;
  /// on an end boundary it leaves the parent.
  pub fn advance(&mut self) -> Result<()> {
    match self.current {
      Node::Start { .. } => self.skip_subtree(),
      Node::End { .. } => {
        self.depth = self.depth.saturating_sub(1);
        self.fill()
      }
      Node::Text(_) => self.fill(),
      Node::Eof => Err(Error::structure(self.offset, "advance past end of input")),
    }
  }

  /// Discard the current element and everything inside it.
  pub fn skip_subtree(&mut self) -> Result<()> {
    let Node::Start { element, .. } = &self.current else {
      return Err(Error::structure(self.offset, "skip on a node that is not an element start"));
    };
    let end = element.name().as_ref().to_vec();
    self.buf.clear();
    self
      .reader
      .read_to_end_into(QName(&end), &mut self.buf)
      .map_err(|e| Error::structure(self.offset, e.to_string()))?;
    self.fill()
  }

  /// Read events until the next significant node.
  fn fill(&mut self) -> Result<()> {
    loop {
      self.buf.clear();
      let offset: u64 = self
        .reader
        .buffer_position()
        .try_into()
        .unwrap_or(u64::MAX);
      let event = self
        .reader
        .read_event_into(&mut self.buf)
        .map_err(|e| Error::structure(offset, e.to_string()))?;

      let node = match event {
        Event::Start(e) => {
          let qname = e.name();
          let name = String::from_utf8_lossy(local_name(qname.as_ref())).into_owned();
          Node::Start {
            element: e.into_owned(),
            name,
          }
        }
        Event::End(e) => {
          let qname = e.name();
          Node::End {
            name: String::from_utf8_lossy(local_name(qname.as_ref())).into_owned(),
          }
        }
        Event::Text(e) => {
          let text = e
            .unescape()
            .map_err(|e| Error::structure(offset, e.to_string()))?;
          if text.is_empty() {
            continue;
          }
          Node::Text(text.into_owned())
        }
        Event::CData(e) => {
          Node::Text(String::from_utf8_lossy(&e.into_inner()).into_owned())
        }
        Event::Eof => Node::Eof,
        // Declarations, comments, processing instructions, doctype.
        _ => continue,
      };

      self.offset = offset;
      self.current = node;
      return Ok(());
    }
  }
}

/// `w:talk` and `talk` both name `talk`.
fn local_name(name: &[u8]) -> &[u8] {
  if let Some(pos) = name.iter().rposition(|&b| b == b':') {
    &name[pos + 1..]
  } else {
    name
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cursor(xml: &str) -> TranscriptReader<&[u8]> {
    TranscriptReader::from_bytes(xml.as_bytes()).unwrap()
  }

  #[test]
  fn walks_nested_structure() {
    let mut r = cursor("<?xml version=\"1.0\"?><a x=\"1\"><b>hi</b><c/></a>");
    assert_eq!(r.kind(), NodeKind::BoundaryStart);
    assert_eq!(r.name(), Some("a"));
    assert_eq!(r.attr("x").unwrap().as_deref(), Some("1"));
    assert_eq!(r.attr("y").unwrap(), None);

    r.descend().unwrap();
    assert_eq!(r.depth(), 1);
    assert!(r.is_start_of("b"));
    r.descend().unwrap();
    assert_eq!(r.text(), Some("hi"));
    r.advance().unwrap();
    assert_eq!(r.kind(), NodeKind::BoundaryEnd);
    assert_eq!(r.name(), Some("b"));
    r.advance().unwrap();
    assert_eq!(r.depth(), 1);
    assert!(r.is_start_of("c"));

    // Empty element: start then end.
    r.descend().unwrap();
    assert_eq!(r.kind(), NodeKind::BoundaryEnd);
    r.advance().unwrap();
    assert_eq!(r.name(), Some("a"));
    assert_eq!(r.kind(), NodeKind::BoundaryEnd);
    r.advance().unwrap();
    assert_eq!(r.kind(), NodeKind::EndOfInput);
    assert_eq!(r.depth(), 0);
  }

  #[test]
  fn skip_subtree_lands_on_next_sibling() {
    let mut r = cursor("<a><b><b><c/></b>text</b><d/></a>");
    r.descend().unwrap();
    assert!(r.is_start_of("b"));
    r.skip_subtree().unwrap();
    assert!(r.is_start_of("d"));
    assert_eq!(r.depth(), 1);
  }

  #[test]
  fn advance_on_start_skips_element() {
    let mut r = cursor("<a><b>x</b>tail</a>");
    r.descend().unwrap();
    r.advance().unwrap();
    assert_eq!(r.text(), Some("tail"));
  }

  #[test]
  fn descend_on_leaf_is_structure_error() {
    let mut r = cursor("<a>just text</a>");
    r.descend().unwrap();
    assert!(matches!(r.descend(), Err(Error::Structure { .. })));
  }

  #[test]
  fn entities_and_prefixes() {
    let mut r = cursor("<w:a xmlns:w=\"urn:x\">Fish &amp; chips</w:a>");
    assert_eq!(r.name(), Some("a"));
    r.descend().unwrap();
    assert_eq!(r.text(), Some("Fish & chips"));
  }

  #[test]
  fn mismatched_end_is_structure_error() {
    let mut r = cursor("<a><b></a>");
    r.descend().unwrap();
    assert!(matches!(r.descend(), Err(Error::Structure { .. })));
  }

  #[test]
  fn whitespace_between_elements_surfaces() {
    let mut r = cursor("<li><b>one</b> <b>two</b></li>");
    r.descend().unwrap();
    r.skip_subtree().unwrap();
    assert_eq!(r.kind(), NodeKind::Text);
    assert_eq!(r.text(), Some(" "));
    r.advance().unwrap();
    assert!(r.is_start_of("b"));
  }

  #[test]
  fn offsets_increase() {
    let mut r = cursor("<a><b/></a>");
    let first = r.offset();
    r.descend().unwrap();
    assert!(r.offset() > first);
  }
}
