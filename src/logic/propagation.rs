//! Propagation: re-derives every slot, match status and the completion flag from recorded results.

use crate::models::{
    Bracket, BracketError, MatchId, MatchStatus, Side, Slot, SlotKey, TeamRef,
};
use std::collections::{BTreeMap, HashMap};

/// Recompute the whole bracket in one forward pass over matches in `(round, position)` order.
///
/// Pure and idempotent: the output depends only on the seeds and the recorded results. A result
/// whose teams no longer match the resolved sides (an upstream correction changed who plays) is
/// discarded. Fails with `SlotConflict` if two matches resolve the same slot.
pub fn recompute(bracket: &Bracket) -> Result<Bracket, BracketError> {
    let mut next = bracket.clone();
    for slot in next.slots.values_mut() {
        if !slot.is_seed() {
            slot.resolved_team = None;
        }
    }

    let mut order: Vec<usize> = (0..next.matches.len()).collect();
    order.sort_by_key(|&i| (next.matches[i].round, next.matches[i].position));

    let mut writers: HashMap<SlotKey, MatchId> = HashMap::new();
    // Set when the upper-bracket finalist wins Game 1.
    let mut moot_champion: Option<TeamRef> = None;

    for i in order {
        let (team_a, team_b) = {
            let m = &next.matches[i];
            (
                next.team_in_slot(&m.side_a).cloned(),
                next.team_in_slot(&m.side_b).cloned(),
            )
        };
        let m = &mut next.matches[i];

        if m.is_final_reset() {
            if let Some(champion) = moot_champion.take() {
                if m.result.take().is_some() {
                    log::warn!("Discarding result of {}: bracket reset is not needed", m.id);
                }
                m.status = MatchStatus::Moot;
                write_slot(&mut next.slots, &mut writers, &m.winner_slot, champion, &m.id)?;
                continue;
            }
        }

        let (a, b) = match (team_a, team_b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                if m.result.take().is_some() {
                    log::warn!("Discarding result of {}: teams are no longer decided", m.id);
                }
                m.status = MatchStatus::WaitingForTeams;
                continue;
            }
        };

        let winner = match &m.result {
            Some(r) if r.side_a_team == a.id && r.side_b_team == b.id => r.winner,
            Some(r) => {
                log::warn!(
                    "Discarding stale result of {}: recorded for {} vs {}, now {} vs {}",
                    m.id,
                    r.side_a_team,
                    r.side_b_team,
                    a.id,
                    b.id
                );
                m.result = None;
                m.status = MatchStatus::Ready;
                continue;
            }
            None => {
                m.status = MatchStatus::Ready;
                continue;
            }
        };
        m.status = MatchStatus::Completed;

        let (won, lost) = match winner {
            Side::A => (a, b),
            Side::B => (b, a),
        };
        if m.is_final_game_one() && winner == Side::A {
            // Upper finalist stays unbeaten: no reset, its slots stay empty.
            moot_champion = Some(won);
            continue;
        }
        write_slot(&mut next.slots, &mut writers, &m.winner_slot, won, &m.id)?;
        if let Some(loser_slot) = &m.loser_slot {
            write_slot(&mut next.slots, &mut writers, loser_slot, lost, &m.id)?;
        }
    }

    next.champion = next.team_in_slot(&SlotKey::champion()).cloned();
    next.is_complete = next.champion.is_some();
    Ok(next)
}

/// Resolve `team` into `key` on behalf of `writer`. A slot may only be written once per pass and
/// only by the match registered as its producer.
fn write_slot(
    slots: &mut BTreeMap<SlotKey, Slot>,
    writers: &mut HashMap<SlotKey, MatchId>,
    key: &SlotKey,
    team: TeamRef,
    writer: &MatchId,
) -> Result<(), BracketError> {
    if let Some(first) = writers.get(key) {
        log::error!("Slot {} written by both {} and {}", key, first, writer);
        return Err(BracketError::SlotConflict {
            slot: key.clone(),
            first: first.clone(),
            second: writer.clone(),
        });
    }
    let slot = slots.get_mut(key).ok_or_else(|| {
        BracketError::Construction(format!("match {} feeds missing slot {}", writer, key))
    })?;
    let owner = match &slot.producer {
        Some(p) => p.match_id.clone(),
        None => MatchId(format!("seed-{}", slot.seed.unwrap_or_default())),
    };
    if &owner != writer {
        log::error!("Slot {} belongs to {} but was written by {}", key, owner, writer);
        return Err(BracketError::SlotConflict {
            slot: key.clone(),
            first: owner,
            second: writer.clone(),
        });
    }
    writers.insert(key.clone(), writer.clone());
    slot.resolved_team = Some(team);
    Ok(())
}
