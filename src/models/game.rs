//! Match, series format and per-game results.

use crate::models::slot::SlotKey;
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bracket match, derived from its place in the topology (e.g. `ub-r2-m1`).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(bracket: BracketType, round: u32, position: u32) -> Self {
        Self(format!("{}-r{}-m{}", bracket.prefix(), round, position))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which part of the double-elimination bracket a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    Upper,
    Lower,
    /// Grand final: Game 1 and the conditional reset.
    Final,
}

impl BracketType {
    /// Name used in slot keys.
    pub fn key(self) -> &'static str {
        match self {
            BracketType::Upper => "upper",
            BracketType::Lower => "lower",
            BracketType::Final => "final",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            BracketType::Upper => "ub",
            BracketType::Lower => "lb",
            BracketType::Final => "gf",
        }
    }
}

/// Best-of-N series format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesFormat {
    Bo1,
    Bo3,
    Bo5,
    Bo7,
}

impl SeriesFormat {
    /// Maximum number of games in the series.
    pub fn max_games(self) -> u32 {
        match self {
            SeriesFormat::Bo1 => 1,
            SeriesFormat::Bo3 => 3,
            SeriesFormat::Bo5 => 5,
            SeriesFormat::Bo7 => 7,
        }
    }

    /// Game wins needed to take the series.
    pub fn wins_needed(self) -> u32 {
        self.max_games() / 2 + 1
    }
}

/// One side of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Score of a single game: side A points, side B points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub a: u32,
    pub b: u32,
}

impl GameScore {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }
}

/// A recorded series result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub games: Vec<GameScore>,
    pub winner: Side,
    /// Teams that played the series. A result whose teams no longer match the
    /// resolved sides is stale and gets discarded on recompute.
    pub side_a_team: TeamId,
    pub side_b_team: TeamId,
    pub recorded_at: DateTime<Utc>,
}

impl MatchResult {
    /// Game wins per side.
    pub fn series_score(&self) -> (u32, u32) {
        self.games.iter().fold((0, 0), |(a, b), g| {
            if g.a > g.b {
                (a + 1, b)
            } else {
                (a, b + 1)
            }
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// At least one side is unresolved.
    #[default]
    WaitingForTeams,
    /// Both sides resolved, no result yet.
    Ready,
    Completed,
    /// Final reset made unnecessary by the upper-bracket finalist winning Game 1.
    Moot,
}

/// Scheduling metadata. Has no effect on propagation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub live: bool,
}

/// A node in the bracket graph.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub bracket_type: BracketType,
    /// Global ordering round; strictly increases along every dependency edge.
    pub round: u32,
    /// Round number within its own bracket (used for keys and display).
    pub bracket_round: u32,
    /// 1-based index within the round.
    pub position: u32,
    pub series_format: SeriesFormat,
    pub side_a: SlotKey,
    pub side_b: SlotKey,
    pub winner_slot: SlotKey,
    /// None when the loser is eliminated.
    pub loser_slot: Option<SlotKey>,
    pub result: Option<MatchResult>,
    pub status: MatchStatus,
    #[serde(default)]
    pub schedule: Schedule,
}

impl Match {
    /// Grand final Game 1 (upper champion on side A, lower champion on side B).
    pub fn is_final_game_one(&self) -> bool {
        self.bracket_type == BracketType::Final && self.bracket_round == 1
    }

    /// Grand final reset.
    pub fn is_final_reset(&self) -> bool {
        self.bracket_type == BracketType::Final && self.bracket_round == 2
    }

    pub fn slot_for(&self, side: Side) -> &SlotKey {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}
