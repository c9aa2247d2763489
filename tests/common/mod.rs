//! Helpers shared by the integration tests.
#![allow(dead_code)]

use playoff_bracket::{
    build_bracket, record_result, recompute, Bracket, FormatPolicy, GameScore, MatchId,
    SeriesFormat, Side, TeamRef,
};
use uuid::Uuid;

/// `n` qualifiers with ids t1..tn, seeded in order.
pub fn teams(n: u32) -> Vec<TeamRef> {
    (1..=n)
        .map(|i| TeamRef::new(format!("t{i}"), format!("Team {i}"), i))
        .collect()
}

/// Freshly built and recomputed bracket with best-of-1 everywhere.
pub fn bracket(n: u32) -> Bracket {
    let b = build_bracket(Uuid::new_v4(), teams(n), &FormatPolicy::uniform(SeriesFormat::Bo1)).unwrap();
    recompute(&b).unwrap()
}

/// Games in which `winner` takes the series after the other side won `losses` games.
pub fn series(format: SeriesFormat, winner: Side, losses: u32) -> Vec<GameScore> {
    let needed = format.wins_needed();
    assert!(losses < needed);
    let (win, loss) = match winner {
        Side::A => (GameScore::new(13, 7), GameScore::new(7, 13)),
        Side::B => (GameScore::new(7, 13), GameScore::new(13, 7)),
    };
    let mut games = vec![loss; losses as usize];
    games.extend(std::iter::repeat(win).take(needed as usize));
    games
}

/// Record a clean sweep for `winner` in match `id` and propagate.
pub fn play(bracket: &Bracket, id: &str, winner: Side) -> Bracket {
    let mut b = bracket.clone();
    let id = MatchId::from(id);
    let format = b.match_by_id(&id).unwrap().series_format;
    record_result(&mut b, &id, series(format, winner, 0)).unwrap();
    recompute(&b).unwrap()
}

/// Side of a match holding the better (lower) seed.
pub fn better_seed(bracket: &Bracket, id: &MatchId) -> Side {
    let m = bracket.match_by_id(id).unwrap();
    let a = bracket.team_in_slot(&m.side_a).unwrap().seed;
    let b = bracket.team_in_slot(&m.side_b).unwrap().seed;
    if a < b {
        Side::A
    } else {
        Side::B
    }
}

/// Play ready matches in bracket order until none are left, picking winners with `choose`.
pub fn play_out(mut bracket: Bracket, mut choose: impl FnMut(&Bracket, &MatchId) -> Side) -> Bracket {
    loop {
        let next = bracket.ready_matches().next().map(|m| m.id.clone());
        let Some(id) = next else {
            break;
        };
        let winner = choose(&bracket, &id);
        bracket = play(&bracket, id.as_str(), winner);
    }
    bracket
}

pub fn team_in(bracket: &Bracket, key: &str) -> Option<String> {
    bracket
        .team_in_slot(&playoff_bracket::SlotKey(key.to_string()))
        .map(|t| t.id.to_string())
}

/// Like [`play_out`], but stops as soon as match `stop` has a result.
pub fn play_until(
    mut bracket: Bracket,
    stop: &str,
    mut choose: impl FnMut(&Bracket, &MatchId) -> Side,
) -> Bracket {
    let stop = MatchId::from(stop);
    while bracket.match_by_id(&stop).map_or(false, |m| m.result.is_none()) {
        let next = bracket.ready_matches().next().map(|m| m.id.clone());
        let Some(id) = next else {
            break;
        };
        let winner = choose(&bracket, &id);
        bracket = play(&bracket, id.as_str(), winner);
    }
    bracket
}
