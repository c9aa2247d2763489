//! Team references handed over by the qualifier list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a team, owned by the registration subsystem.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A qualified team as the bracket sees it. Immutable once the bracket is built.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    #[serde(rename = "team_id")]
    pub id: TeamId,
    #[serde(rename = "team_name")]
    pub name: String,
    /// 1-based rank in the qualifier list; a field of N teams uses exactly 1..=N.
    pub seed: u32,
}

impl TeamRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, seed: u32) -> Self {
        Self {
            id: TeamId::new(id),
            name: name.into(),
            seed,
        }
    }
}
