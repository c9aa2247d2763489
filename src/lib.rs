//! Double-elimination playoff bracket engine: topology, match state machine, propagation,
//! and a versioned bracket service with a REST API.

pub mod api;
pub mod config;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use logic::{
    build_bracket, clear_result, decide_series, eliminations, record_result, recompute,
    set_match_format, set_schedule, standings, FormatPolicy,
};
pub use models::{
    Bracket, BracketError, BracketType, Elimination, GameScore, Match, MatchId, MatchResult,
    MatchStatus, Outcome, Producer, Schedule, SeriesFormat, Side, Slot, SlotKey, Standing, TeamId,
    TeamRef, TournamentId,
};
pub use service::BracketService;
pub use store::{BracketStore, JsonFileStore, MemoryStore, StoredBracket};
