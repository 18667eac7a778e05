//! The assignment state machine for inward entries.
//!
//! ```text
//!              assign                 update            update / link
//! Unassigned ─────────▶ Pending ◀────────────▶ In Progress ─────────▶ Completed
//!                          ▲                                              │
//!                          └───────────────── reassign ───────────────────┘
//! ```
//!
//! Assignment (first or repeated) always lands in `Pending`. Only explicit
//! status updates move between `Pending` and `In Progress`. `Completed` is
//! terminal for status updates; only a reassignment leaves it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, team::Team};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum AssignmentStatus {
  Unassigned,
  Pending,
  #[strum(to_string = "In Progress", serialize = "InProgress")]
  InProgress,
  Completed,
}

/// What a status-update request does to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
  /// The entry is already in the requested state; nothing is written.
  Unchanged,
  /// Move to the given state.
  To(AssignmentStatus),
}

impl AssignmentStatus {
  /// The stored and wire representation.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Unassigned => "Unassigned",
      Self::Pending => "Pending",
      Self::InProgress => "In Progress",
      Self::Completed => "Completed",
    }
  }

  /// Parse a caller-supplied status. Anything outside the four states is an
  /// [`Error::InvalidStatus`].
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::InvalidStatus(s.to_owned()))
  }

  /// State of a freshly created entry.
  pub fn initial(team: Option<Team>) -> Self {
    if team.is_some() { Self::Pending } else { Self::Unassigned }
  }

  /// Decide the effect of an explicit status update from `self` to `target`.
  ///
  /// - `Unassigned` can neither be left nor entered through a status update;
  ///   assignment is a separate operation.
  /// - `Completed` only accepts `Completed` again, as a no-op.
  pub fn request(self, target: Self) -> Result<StatusChange> {
    let illegal = || Error::IllegalTransition { from: self, to: target };
    match (self, target) {
      (_, Self::Unassigned) | (Self::Unassigned, _) => Err(illegal()),
      (Self::Completed, Self::Completed) => Ok(StatusChange::Unchanged),
      (Self::Completed, _) => Err(illegal()),
      (from, to) if from == to => Ok(StatusChange::Unchanged),
      (_, to) => Ok(StatusChange::To(to)),
    }
  }
}

impl From<AssignmentStatus> for &'static str {
  fn from(status: AssignmentStatus) -> Self { status.as_str() }
}

impl TryFrom<String> for AssignmentStatus {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}
