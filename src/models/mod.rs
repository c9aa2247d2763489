//! Data structures for the playoff bracket: teams, slots, matches, bracket state.

mod bracket;
mod game;
mod slot;
mod team;

pub use bracket::{Bracket, BracketError, Elimination, Standing, TournamentId};
pub use game::{
    BracketType, GameScore, Match, MatchId, MatchResult, MatchStatus, Schedule, SeriesFormat, Side,
};
pub use slot::{Outcome, Producer, Slot, SlotKey};
pub use team::{TeamId, TeamRef};
