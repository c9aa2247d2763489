//! Bracket business logic: topology, match state machine, propagation, standings.

mod propagation;
mod series;
mod standings;
mod topology;

pub use propagation::recompute;
pub use series::{clear_result, decide_series, record_result, set_match_format, set_schedule};
pub use standings::{eliminations, standings};
pub use topology::{build_bracket, seed_order, upper_loser_slot, validate_topology, FormatPolicy};
