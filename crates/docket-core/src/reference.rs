//! Human-readable reference numbers, e.g. `INW/2025/007`.
//!
//! The sequence restarts at 1 for each (kind, calendar year) pair. The
//! sequence part is zero-padded to three digits and simply grows past `999`.
//! Minting is the store's job: it must hand out each (kind, year, seq)
//! exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which register an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  Inward,
  Outward,
}

impl EntryKind {
  /// The prefix of the reference number.
  pub fn code(self) -> &'static str {
    match self {
      Self::Inward => "INW",
      Self::Outward => "OTW",
    }
  }

  fn from_code(code: &str) -> Option<Self> {
    match code {
      "INW" => Some(Self::Inward),
      "OTW" => Some(Self::Outward),
      _ => None,
    }
  }
}

/// A minted reference number. Orders by kind, then year, then sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ReferenceNo {
  pub kind: EntryKind,
  pub year: i32,
  pub seq:  u32,
}

impl ReferenceNo {
  pub fn new(kind: EntryKind, year: i32, seq: u32) -> Self { Self { kind, year, seq } }

  pub fn parse(s: &str) -> Result<Self> {
    let malformed = || Error::validation(format!("malformed reference number: {s:?}"));

    let mut parts = s.split('/');
    let (Some(code), Some(year), Some(seq), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(malformed());
    };

    let kind = EntryKind::from_code(code).ok_or_else(malformed)?;
    if seq.len() < 3 {
      return Err(malformed());
    }
    let year = year.parse().map_err(|_| malformed())?;
    let seq = seq.parse().map_err(|_| malformed())?;
    if seq == 0 {
      return Err(malformed());
    }
    Ok(Self { kind, year, seq })
  }
}

impl fmt::Display for ReferenceNo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{:03}", self.kind.code(), self.year, self.seq)
  }
}

impl From<ReferenceNo> for String {
  fn from(r: ReferenceNo) -> Self { r.to_string() }
}

impl TryFrom<String> for ReferenceNo {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_with_three_digit_padding() {
    assert_eq!(ReferenceNo::new(EntryKind::Inward, 2025, 7).to_string(), "INW/2025/007");
    assert_eq!(ReferenceNo::new(EntryKind::Outward, 2025, 12).to_string(), "OTW/2025/012");
  }

  #[test]
  fn grows_past_three_digits_without_wrapping() {
    assert_eq!(ReferenceNo::new(EntryKind::Inward, 2025, 1000).to_string(), "INW/2025/1000");
  }

  #[test]
  fn parse_accepts_what_display_produces() {
    let r = ReferenceNo::parse("OTW/2024/031").unwrap();
    assert_eq!(r, ReferenceNo::new(EntryKind::Outward, 2024, 31));
    assert_eq!(ReferenceNo::parse(&r.to_string()).unwrap(), r);
  }

  #[test]
  fn parse_rejects_garbage() {
    for bad in ["", "INW/2025", "INW/2025/7", "XYZ/2025/007", "INW/20x5/007", "INW/2025/000", "INW/2025/001/x"] {
      assert!(ReferenceNo::parse(bad).is_err(), "{bad:?} should not parse");
    }
  }

  #[test]
  fn orders_by_year_then_sequence() {
    let a = ReferenceNo::new(EntryKind::Inward, 2024, 900);
    let b = ReferenceNo::new(EntryKind::Inward, 2025, 1);
    let c = ReferenceNo::new(EntryKind::Inward, 2025, 2);
    assert!(a < b && b < c);
  }
}
