//! The three fixed work groups and the team → leader e-mail directory.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

use crate::{Error, Result};

/// A work group to which inward entries are assigned.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Team {
  #[strum(to_string = "UG")]
  Ug,
  /// Accepts `PG-PRO` and `PG_PRO` as well, for contexts where `/` is
  /// awkward (URLs, environment variables).
  #[strum(to_string = "PG/PRO", serialize = "PG-PRO", serialize = "PG_PRO")]
  PgPro,
  #[strum(to_string = "PhD")]
  Phd,
}

impl Team {
  /// The canonical name, also used as the stored column value.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Ug => "UG",
      Self::PgPro => "PG/PRO",
      Self::Phd => "PhD",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownTeam(s.to_owned()))
  }

  pub fn all() -> impl Iterator<Item = Team> { Self::iter() }
}

impl From<Team> for &'static str {
  fn from(team: Team) -> Self { team.as_str() }
}

impl TryFrom<String> for Team {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Maps each team to its leader's address. Used to fill `assignedToEmail`
/// when a caller assigns a team without naming a recipient.
///
/// Deserialises from a `{ team-name: address }` table; teams missing from the
/// table keep their default address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub struct TeamDirectory {
  leaders: BTreeMap<Team, String>,
}

impl Default for TeamDirectory {
  fn default() -> Self {
    let leaders = BTreeMap::from([
      (Team::Ug, "ug.lead@office.example".to_owned()),
      (Team::PgPro, "pgpro.lead@office.example".to_owned()),
      (Team::Phd, "phd.lead@office.example".to_owned()),
    ]);
    Self { leaders }
  }
}

impl TeamDirectory {
  /// Replace the leader address for `team`.
  pub fn with_leader(mut self, team: Team, address: impl Into<String>) -> Self {
    self.leaders.insert(team, address.into());
    self
  }

  pub fn leader(&self, team: Team) -> Option<&str> {
    self.leaders.get(&team).map(String::as_str)
  }

  /// The recipient for an assignment: a non-blank caller-supplied address
  /// wins, otherwise the team's leader.
  pub fn resolve(&self, team: Team, explicit: Option<&str>) -> Option<String> {
    explicit
      .map(str::trim)
      .filter(|e| !e.is_empty())
      .or_else(|| self.leader(team))
      .map(str::to_owned)
  }
}

impl TryFrom<HashMap<String, String>> for TeamDirectory {
  type Error = Error;

  fn try_from(table: HashMap<String, String>) -> Result<Self> {
    table
      .into_iter()
      .try_fold(Self::default(), |dir, (name, address)| {
        Ok(dir.with_leader(Team::parse(&name)?, address))
      })
  }
}
