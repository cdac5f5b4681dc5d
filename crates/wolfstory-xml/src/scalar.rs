//! Decoders for primitive lexical forms embedded in attributes.
//!
//! These never fail: malformed input yields `None`. Callers decide whether
//! a missing value is an error for their record.

use wolfstory_core::{
  entry::{Faction, UtteranceKind},
  story::{GameState, RoundKind},
  time::TimeOfDay,
};

/// Decode `HH:MM:SS[.fraction]`.
///
/// Fractional seconds are truncated to milliseconds and right-padded with
/// zeros (`.2` is 200 ms). Anything after the seconds field other than a
/// fraction, such as a zone suffix, is ignored.
pub fn decode_time_of_day(text: &str) -> Option<TimeOfDay> {
  let bytes = text.as_bytes();
  if bytes.len() < 8 || bytes[2] != b':' || bytes[5] != b':' {
    return None;
  }
  let hour = two_digits(&bytes[0..2])?;
  let minute = two_digits(&bytes[3..5])?;
  let second = two_digits(&bytes[6..8])?;

  let milli = match bytes.get(8) {
    Some(b'.') => {
      let mut milli = 0;
      let mut digits = 0;
      for &b in bytes[9..].iter().take_while(|b| b.is_ascii_digit()).take(3) {
        milli = milli * 10 + u32::from(b - b'0');
        digits += 1;
      }
      milli * 10u32.pow(3 - digits)
    }
    _ => 0,
  };

  TimeOfDay::from_hms_milli(hour, minute, second, milli)
}

fn two_digits(field: &[u8]) -> Option<u32> {
  match field {
    [hi, lo] if hi.is_ascii_digit() && lo.is_ascii_digit() => {
      Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
    }
    _ => None,
  }
}

pub fn decode_number(text: &str) -> Option<u32> { text.trim().parse().ok() }

pub fn decode_round_kind(text: &str) -> Option<RoundKind> {
  match text.trim() {
    "prologue" => Some(RoundKind::Opening),
    "progress" => Some(RoundKind::InProgress),
    "epilogue" => Some(RoundKind::Closing),
    _ => None,
  }
}

pub fn decode_utterance_kind(text: &str) -> Option<UtteranceKind> {
  match text.trim() {
    "public" => Some(UtteranceKind::Public),
    "wolf" => Some(UtteranceKind::Faction),
    "private" => Some(UtteranceKind::Private),
    "grave" => Some(UtteranceKind::Posthumous),
    _ => None,
  }
}

pub fn decode_game_state(text: &str) -> Option<GameState> {
  match text.trim() {
    "progress" => Some(GameState::InProgress),
    "concluded" => Some(GameState::Concluded),
    _ => None,
  }
}

pub fn decode_faction(text: &str) -> Option<Faction> {
  text.trim().parse().ok()
}
