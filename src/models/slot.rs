//! Slots: placeholders for "whoever wins/loses match X".

use crate::models::game::{BracketType, MatchId};
use crate::models::team::TeamRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic slot key derived from the slot's position in the topology,
/// e.g. `bracket:lower:round:4:slot:1`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(pub String);

impl SlotKey {
    /// Key of slot `slot` (1-based) in round `round` of the given bracket.
    /// Match `p` of a round owns slots `2p - 1` (side A) and `2p` (side B).
    pub fn new(bracket: BracketType, round: u32, slot: u32) -> Self {
        Self(format!("bracket:{}:round:{}:slot:{}", bracket.key(), round, slot))
    }

    /// The terminal, consumer-less slot holding the tournament champion.
    pub fn champion() -> Self {
        Self("bracket:final:champion".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which result of the producer match fills a slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner,
    Loser,
}

/// The match outcome that fills a slot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub match_id: MatchId,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub key: SlotKey,
    /// None only for upper round 1 seed slots.
    pub producer: Option<Producer>,
    /// Seed (1-based) that fills this slot directly; set only on seed slots.
    pub seed: Option<u32>,
    /// Derived by propagation; never written by callers.
    pub resolved_team: Option<TeamRef>,
}

impl Slot {
    pub fn seeded(key: SlotKey, seed: u32, team: TeamRef) -> Self {
        Self {
            key,
            producer: None,
            seed: Some(seed),
            resolved_team: Some(team),
        }
    }

    pub fn produced_by(key: SlotKey, match_id: MatchId, outcome: Outcome) -> Self {
        Self {
            key,
            producer: Some(Producer { match_id, outcome }),
            seed: None,
            resolved_team: None,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.producer.is_none()
    }
}
