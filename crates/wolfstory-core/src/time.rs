//! Time-of-day values attached to utterances.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A wall-clock time with millisecond precision.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
  /// Returns `None` when any field is out of range.
  pub fn from_hms_milli(hour: u32, minute: u32, second: u32, milli: u32) -> Option<Self> {
    NaiveTime::from_hms_milli_opt(hour, minute, second, milli).map(Self)
  }

  pub fn hour(&self) -> u32 { self.0.hour() }

  pub fn minute(&self) -> u32 { self.0.minute() }

  pub fn second(&self) -> u32 { self.0.second() }

  pub fn millisecond(&self) -> u32 { self.0.nanosecond() / 1_000_000 }

  pub fn as_naive(&self) -> NaiveTime { self.0 }
}

impl fmt::Display for TimeOfDay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields_and_display() {
    let t = TimeOfDay::from_hms_milli(9, 5, 30, 250).unwrap();
    assert_eq!((t.hour(), t.minute(), t.second(), t.millisecond()), (9, 5, 30, 250));
    assert_eq!(t.to_string(), "09:05:30.250");
  }

  #[test]
  fn out_of_range_is_none() {
    assert!(TimeOfDay::from_hms_milli(24, 0, 0, 0).is_none());
    assert!(TimeOfDay::from_hms_milli(12, 60, 0, 0).is_none());
  }
}
