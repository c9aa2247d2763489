//! Bracket topology: builds the double-elimination match/slot graph from a ranked qualifier list.
//!
//! All wiring is derived from (bracket, round, position); there is no lookup table of slot ids.
//! With `k = log2(N)`:
//! - upper round `r` (1..=k) has `N / 2^r` matches, global round `2r - 1`;
//! - lower round `L` (1..=2(k-1)) has `N / 2^((L+3)/2)` matches when odd and `N / 2^(L/2+1)` when
//!   even, global round `L + 2`;
//! - grand final Game 1 and Reset sit at global rounds `2k + 1` and `2k + 2`.

use crate::models::{
    Bracket, BracketError, BracketType, Match, MatchId, MatchStatus, Outcome, Schedule,
    SeriesFormat, Slot, SlotKey, TeamRef, TournamentId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default series formats per stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatPolicy {
    /// Upper round 1 and lower rounds 1-2.
    pub opening: SeriesFormat,
    /// Every other upper and lower match.
    pub standard: SeriesFormat,
    /// Game 1 and the reset.
    pub grand_final: SeriesFormat,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            opening: SeriesFormat::Bo1,
            standard: SeriesFormat::Bo3,
            grand_final: SeriesFormat::Bo5,
        }
    }
}

impl FormatPolicy {
    /// Same format everywhere.
    pub fn uniform(format: SeriesFormat) -> Self {
        Self {
            opening: format,
            standard: format,
            grand_final: format,
        }
    }

    pub fn format_for(&self, bracket: BracketType, bracket_round: u32) -> SeriesFormat {
        match bracket {
            BracketType::Final => self.grand_final,
            BracketType::Upper if bracket_round == 1 => self.opening,
            BracketType::Lower if bracket_round <= 2 => self.opening,
            _ => self.standard,
        }
    }
}

/// Seed order of upper round 1 for `n` teams: consecutive pairs play each other.
/// 8 teams give `[1, 8, 4, 5, 2, 7, 3, 6]`, so seeds 1 and 2 can only meet in the upper final.
pub fn seed_order(n: u32) -> Vec<u32> {
    let mut order = vec![1];
    let mut size = 1;
    while size < n {
        size *= 2;
        order = order
            .iter()
            .flat_map(|&s| [s, size + 1 - s])
            .collect();
    }
    order
}

/// Number of matches in upper round `r`.
fn upper_round_size(n: u32, r: u32) -> u32 {
    n >> r
}

/// Number of matches in lower round `l`.
fn lower_round_size(n: u32, l: u32) -> u32 {
    if l % 2 == 1 {
        n >> ((l + 3) / 2)
    } else {
        n >> (l / 2 + 1)
    }
}

/// Lower-bracket slot that receives the loser of upper match (`r`, `p`), for `k >= 2`.
///
/// Round 1 losers pair up in lower round 1. A round `r >= 2` loser drops into lower round
/// `2(r - 1)` on side B, with the position order flipped on even rounds to delay rematches.
pub fn upper_loser_slot(n: u32, r: u32, p: u32) -> SlotKey {
    if r == 1 {
        return SlotKey::new(BracketType::Lower, 1, p);
    }
    let round = 2 * (r - 1);
    let size = upper_round_size(n, r);
    let q = if r % 2 == 1 { p } else { size - p + 1 };
    SlotKey::new(BracketType::Lower, round, 2 * q)
}

fn side_slots(bracket: BracketType, round: u32, p: u32) -> (SlotKey, SlotKey) {
    (
        SlotKey::new(bracket, round, 2 * p - 1),
        SlotKey::new(bracket, round, 2 * p),
    )
}

fn game_one_slots() -> (SlotKey, SlotKey) {
    side_slots(BracketType::Final, 1, 1)
}

fn reset_slots() -> (SlotKey, SlotKey) {
    side_slots(BracketType::Final, 2, 1)
}

fn new_match(
    bracket: BracketType,
    bracket_round: u32,
    round: u32,
    position: u32,
    winner_slot: SlotKey,
    loser_slot: Option<SlotKey>,
    policy: &FormatPolicy,
) -> Match {
    let (side_a, side_b) = side_slots(bracket, bracket_round, position);
    Match {
        id: MatchId::new(bracket, bracket_round, position),
        bracket_type: bracket,
        round,
        bracket_round,
        position,
        series_format: policy.format_for(bracket, bracket_round),
        side_a,
        side_b,
        winner_slot,
        loser_slot,
        result: None,
        status: MatchStatus::WaitingForTeams,
        schedule: Schedule::default(),
    }
}

fn upper_matches(n: u32, k: u32, policy: &FormatPolicy) -> Vec<Match> {
    let (gf_a, gf_b) = game_one_slots();
    let mut matches = Vec::new();
    for r in 1..=k {
        for p in 1..=upper_round_size(n, r) {
            let winner = if r < k {
                // Match p feeds slot p of the next round (side A when odd, side B when even).
                SlotKey::new(BracketType::Upper, r + 1, p)
            } else {
                gf_a.clone()
            };
            let loser = if k == 1 {
                gf_b.clone()
            } else {
                upper_loser_slot(n, r, p)
            };
            matches.push(new_match(BracketType::Upper, r, 2 * r - 1, p, winner, Some(loser), policy));
        }
    }
    matches
}

fn lower_matches(n: u32, k: u32, policy: &FormatPolicy) -> Vec<Match> {
    let (_, gf_b) = game_one_slots();
    let last = 2 * (k - 1);
    let mut matches = Vec::new();
    for l in 1..=last {
        for p in 1..=lower_round_size(n, l) {
            let winner = if l == last {
                gf_b.clone()
            } else if l % 2 == 1 {
                // Same-size round next: survivor takes side A against a dropping upper loser.
                SlotKey::new(BracketType::Lower, l + 1, 2 * p - 1)
            } else {
                SlotKey::new(BracketType::Lower, l + 1, p)
            };
            matches.push(new_match(BracketType::Lower, l, l + 2, p, winner, None, policy));
        }
    }
    matches
}

fn final_matches(k: u32, policy: &FormatPolicy) -> Vec<Match> {
    let (reset_a, reset_b) = reset_slots();
    vec![
        new_match(
            BracketType::Final,
            1,
            2 * k + 1,
            1,
            reset_a,
            Some(reset_b),
            policy,
        ),
        new_match(
            BracketType::Final,
            2,
            2 * k + 2,
            1,
            SlotKey::champion(),
            None,
            policy,
        ),
    ]
}

/// Sorts qualifiers by seed and rejects lists that cannot form a bracket.
fn ranked_teams(mut teams: Vec<TeamRef>) -> Result<Vec<TeamRef>, BracketError> {
    let n = teams.len();
    if n < 2 {
        return Err(BracketError::Construction(format!(
            "need at least 2 teams, got {}",
            n
        )));
    }
    if !n.is_power_of_two() {
        return Err(BracketError::Construction(format!(
            "team count must be a power of two, got {}",
            n
        )));
    }
    let mut ids = HashSet::new();
    let mut seeds = HashSet::new();
    for t in &teams {
        if !ids.insert(t.id.clone()) {
            return Err(BracketError::Construction(format!("duplicate team {}", t.id)));
        }
        if t.seed < 1 || t.seed as usize > n {
            return Err(BracketError::Construction(format!(
                "seed {} of team {} is outside 1..={}",
                t.seed, t.id, n
            )));
        }
        if !seeds.insert(t.seed) {
            return Err(BracketError::Construction(format!("duplicate seed {}", t.seed)));
        }
    }
    teams.sort_by_key(|t| t.seed);
    Ok(teams)
}

/// Build a fully-wired bracket with no results. Upper round 1 slots are filled from the
/// qualifiers (ranked by their `seed`, which must be 1..=N); every other slot starts unresolved.
/// Upper round 1 matches come out `Ready`, everything else `WaitingForTeams`.
pub fn build_bracket(
    tournament_id: TournamentId,
    teams: Vec<TeamRef>,
    policy: &FormatPolicy,
) -> Result<Bracket, BracketError> {
    let teams = ranked_teams(teams)?;
    let n = teams.len() as u32;
    let k = n.trailing_zeros();

    let mut matches = upper_matches(n, k, policy);
    matches.extend(lower_matches(n, k, policy));
    matches.extend(final_matches(k, policy));
    matches.sort_by_key(|m| (m.round, m.position));

    let mut slots = BTreeMap::new();
    for (i, seed) in seed_order(n).into_iter().enumerate() {
        let key = SlotKey::new(BracketType::Upper, 1, i as u32 + 1);
        let team = teams[seed as usize - 1].clone();
        slots.insert(key.clone(), Slot::seeded(key, seed, team));
    }
    for m in &matches {
        let mut outputs = vec![(m.winner_slot.clone(), Outcome::Winner)];
        if let Some(loser) = &m.loser_slot {
            outputs.push((loser.clone(), Outcome::Loser));
        }
        for (key, outcome) in outputs {
            if let Some(existing) = slots.get(&key) {
                return Err(BracketError::Construction(format!(
                    "slot {} fed by {} and {}",
                    key,
                    producer_name(existing),
                    m.id
                )));
            }
            slots.insert(key.clone(), Slot::produced_by(key, m.id.clone(), outcome));
        }
    }

    for m in &mut matches {
        let resolved = |key: &SlotKey| slots.get(key).map_or(false, |s| s.resolved_team.is_some());
        if resolved(&m.side_a) && resolved(&m.side_b) {
            m.status = MatchStatus::Ready;
        }
    }

    let now = Utc::now();
    let bracket = Bracket {
        tournament_id,
        teams,
        matches,
        slots,
        is_complete: false,
        champion: None,
        created_at: now,
        updated_at: now,
    };
    validate_topology(&bracket)?;
    Ok(bracket)
}

fn producer_name(slot: &Slot) -> String {
    match &slot.producer {
        Some(p) => p.match_id.to_string(),
        None => format!("seed {}", slot.seed.unwrap_or_default()),
    }
}

/// Check the structural invariants of a bracket graph:
/// every side slot exists and is consumed once, every non-terminal slot is consumed,
/// and every producer → consumer edge strictly increases `round`.
pub fn validate_topology(bracket: &Bracket) -> Result<(), BracketError> {
    let rounds: HashMap<&MatchId, u32> = bracket.matches.iter().map(|m| (&m.id, m.round)).collect();
    let mut consumed: HashMap<&SlotKey, &MatchId> = HashMap::new();

    for m in &bracket.matches {
        for key in [&m.side_a, &m.side_b] {
            let slot = bracket.slots.get(key).ok_or_else(|| {
                BracketError::Construction(format!("match {} reads missing slot {}", m.id, key))
            })?;
            if let Some(other) = consumed.insert(key, &m.id) {
                return Err(BracketError::Construction(format!(
                    "slot {} consumed by both {} and {}",
                    key, other, m.id
                )));
            }
            if let Some(producer) = &slot.producer {
                let from = rounds.get(&producer.match_id).ok_or_else(|| {
                    BracketError::Construction(format!(
                        "slot {} produced by unknown match {}",
                        key, producer.match_id
                    ))
                })?;
                if *from >= m.round {
                    return Err(BracketError::Construction(format!(
                        "edge {} -> {} does not move forward in rounds",
                        producer.match_id, m.id
                    )));
                }
            }
        }
    }

    let champion = SlotKey::champion();
    for key in bracket.slots.keys() {
        if *key != champion && !consumed.contains_key(key) {
            return Err(BracketError::Construction(format!("slot {} has no consumer", key)));
        }
    }
    if !bracket.slots.contains_key(&champion) {
        return Err(BracketError::Construction("champion slot missing".to_string()));
    }
    Ok(())
}
