//! Eliminations and final placements derived from a recomputed bracket.

use crate::models::{
    Bracket, BracketType, Elimination, Match, MatchStatus, Side, Standing,
};

/// Whether the loser of a completed match is out of the tournament.
/// Game 1 only eliminates when the reset turned out moot.
fn eliminates_loser(bracket: &Bracket, m: &Match) -> bool {
    if m.is_final_game_one() {
        return bracket
            .final_reset()
            .map_or(false, |reset| reset.status == MatchStatus::Moot);
    }
    m.loser_slot.is_none()
}

/// Every team knocked out so far, with the match that knocked it out, in bracket order.
pub fn eliminations(bracket: &Bracket) -> Vec<Elimination> {
    bracket
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed && eliminates_loser(bracket, m))
        .filter_map(|m| {
            let result = m.result.as_ref()?;
            let loser = match result.winner {
                Side::A => &result.side_b_team,
                Side::B => &result.side_a_team,
            };
            Some(Elimination {
                team: bracket.team(loser)?.clone(),
                match_id: m.id.clone(),
            })
        })
        .collect()
}

/// Placements of every team whose run is over, best first.
///
/// The grand-final loser is 2nd. A team knocked out in a lower round finishes behind everyone
/// still alive after that round: place = N - (lower matches up to that round) + 1.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    let n = bracket.teams.len() as u32;
    let mut table: Vec<Standing> = eliminations(bracket)
        .into_iter()
        .filter_map(|e| {
            let m = bracket.match_by_id(&e.match_id)?;
            let place = if m.bracket_type == BracketType::Final {
                2
            } else {
                let knocked_out = bracket
                    .matches_in(BracketType::Lower)
                    .filter(|l| l.round <= m.round)
                    .count() as u32;
                n - knocked_out + 1
            };
            Some(Standing {
                place,
                team: e.team,
                eliminated_in: Some(e.match_id),
            })
        })
        .collect();
    if let Some(champion) = &bracket.champion {
        table.push(Standing {
            place: 1,
            team: champion.clone(),
            eliminated_in: None,
        });
    }
    table.sort_by_key(|s| (s.place, s.team.seed));
    table
}
