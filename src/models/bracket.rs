//! Bracket: the full match/slot graph of one tournament's playoffs, and BracketError.

use crate::models::game::{BracketType, Match, MatchId, MatchStatus};
use crate::models::slot::{Slot, SlotKey};
use crate::models::team::{TeamId, TeamRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a tournament (one bracket per tournament).
pub type TournamentId = Uuid;

/// Errors that can occur while building, updating or persisting a bracket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketError {
    /// Invalid team count, duplicate qualifiers or a miswired topology.
    Construction(String),
    /// Recorded games do not yet give either side a majority.
    IncompleteSeries {
        match_id: MatchId,
        wins_a: u32,
        wins_b: u32,
        needed: u32,
    },
    /// A game score is malformed (tie, too many games, games after the series was decided).
    InvalidScore { match_id: MatchId, reason: String },
    /// Two matches tried to resolve the same slot.
    SlotConflict {
        slot: SlotKey,
        first: MatchId,
        second: MatchId,
    },
    /// The stored bracket changed since it was loaded.
    OptimisticConcurrency {
        expected: Option<u64>,
        actual: Option<u64>,
    },
    MatchNotFound(MatchId),
    /// Match does not have both teams yet (or is a moot reset).
    MatchNotReady(MatchId),
    /// Format changes are only allowed before a result exists.
    ResultAlreadyRecorded(MatchId),
    AlreadyInitialized(TournamentId),
    NotInitialized(TournamentId),
    /// Backing store failure (I/O, serialization, poisoned lock).
    Storage(String),
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::Construction(reason) => write!(f, "Cannot build bracket: {}", reason),
            BracketError::IncompleteSeries {
                match_id,
                wins_a,
                wins_b,
                needed,
            } => write!(
                f,
                "Series in match {} is not decided ({}-{}, {} wins needed)",
                match_id, wins_a, wins_b, needed
            ),
            BracketError::InvalidScore { match_id, reason } => {
                write!(f, "Invalid score for match {}: {}", match_id, reason)
            }
            BracketError::SlotConflict { slot, first, second } => write!(
                f,
                "Slot {} resolved by both {} and {}",
                slot, first, second
            ),
            BracketError::OptimisticConcurrency { expected, actual } => write!(
                f,
                "Bracket was modified concurrently (expected version {:?}, found {:?})",
                expected, actual
            ),
            BracketError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            BracketError::MatchNotReady(id) => write!(f, "Match {} is not ready for a result", id),
            BracketError::ResultAlreadyRecorded(id) => {
                write!(f, "Match {} already has a result", id)
            }
            BracketError::AlreadyInitialized(id) => {
                write!(f, "Bracket for tournament {} is already initialized", id)
            }
            BracketError::NotInitialized(id) => {
                write!(f, "No bracket for tournament {}", id)
            }
            BracketError::Storage(reason) => write!(f, "Storage error: {}", reason),
        }
    }
}

impl std::error::Error for BracketError {}

/// A team knocked out of the playoffs and the match that did it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Elimination {
    pub team: TeamRef,
    pub match_id: MatchId,
}

/// Final placement of a team whose run is over. Teams knocked out in the same round share a place.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub place: u32,
    pub team: TeamRef,
    /// None for the champion.
    pub eliminated_in: Option<MatchId>,
}

/// Full bracket state: matches, slots and the derived completion fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    /// Qualifiers in seed order.
    pub teams: Vec<TeamRef>,
    /// Sorted by (round, position).
    pub matches: Vec<Match>,
    pub slots: BTreeMap<SlotKey, Slot>,
    /// Derived: champion slot resolved and no reset pending.
    pub is_complete: bool,
    /// Derived: team in the champion slot.
    pub champion: Option<TeamRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bracket {
    pub fn match_by_id(&self, id: &MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| &m.id == id)
    }

    pub fn match_by_id_mut(&mut self, id: &MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| &m.id == id)
    }

    /// Matches of one bracket part, in (round, position) order.
    pub fn matches_in(&self, bracket: BracketType) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.bracket_type == bracket)
    }

    pub fn slot(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    /// Team currently resolved into the slot, if any.
    pub fn team_in_slot(&self, key: &SlotKey) -> Option<&TeamRef> {
        self.slots.get(key).and_then(|s| s.resolved_team.as_ref())
    }

    /// Matches that have both teams and are waiting for a result.
    pub fn ready_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.status == MatchStatus::Ready)
    }

    pub fn team(&self, id: &TeamId) -> Option<&TeamRef> {
        self.teams.iter().find(|t| &t.id == id)
    }

    pub fn final_game_one(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.is_final_game_one())
    }

    pub fn final_reset(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.is_final_reset())
    }
}
