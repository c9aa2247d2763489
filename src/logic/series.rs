//! Match state machine: recording, correcting and clearing series results.
//!
//! These are the only mutations callers make on a bracket. Slot resolution is left to
//! [`recompute`](crate::logic::recompute), which must run afterwards.

use crate::models::{
    Bracket, BracketError, GameScore, MatchId, MatchResult, MatchStatus, Schedule, SeriesFormat,
    Side,
};
use chrono::Utc;

/// Decide the winning side of a series from per-game scores.
///
/// Fails with `InvalidScore` on a tied game, more games than the format allows, or games played
/// after one side already clinched; with `IncompleteSeries` when nobody has a majority yet.
pub fn decide_series(
    match_id: &MatchId,
    format: SeriesFormat,
    games: &[GameScore],
) -> Result<Side, BracketError> {
    let needed = format.wins_needed();
    if games.len() as u32 > format.max_games() {
        return Err(BracketError::InvalidScore {
            match_id: match_id.clone(),
            reason: format!(
                "{} games recorded, format allows at most {}",
                games.len(),
                format.max_games()
            ),
        });
    }
    let (mut wins_a, mut wins_b) = (0, 0);
    for (i, game) in games.iter().enumerate() {
        if wins_a >= needed || wins_b >= needed {
            return Err(BracketError::InvalidScore {
                match_id: match_id.clone(),
                reason: format!("game {} recorded after the series was decided", i + 1),
            });
        }
        if game.a == game.b {
            return Err(BracketError::InvalidScore {
                match_id: match_id.clone(),
                reason: format!("game {} is tied {}-{}", i + 1, game.a, game.b),
            });
        }
        if game.a > game.b {
            wins_a += 1;
        } else {
            wins_b += 1;
        }
    }
    if wins_a >= needed {
        Ok(Side::A)
    } else if wins_b >= needed {
        Ok(Side::B)
    } else {
        Err(BracketError::IncompleteSeries {
            match_id: match_id.clone(),
            wins_a,
            wins_b,
            needed,
        })
    }
}

/// Record (or overwrite) the result of a match. The match must be `Ready` or `Completed`.
pub fn record_result(
    bracket: &mut Bracket,
    match_id: &MatchId,
    games: Vec<GameScore>,
) -> Result<Side, BracketError> {
    let m = bracket
        .match_by_id(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.clone()))?;
    if !matches!(m.status, MatchStatus::Ready | MatchStatus::Completed) {
        return Err(BracketError::MatchNotReady(match_id.clone()));
    }
    let (team_a, team_b) = match (bracket.team_in_slot(&m.side_a), bracket.team_in_slot(&m.side_b)) {
        (Some(a), Some(b)) => (a.id.clone(), b.id.clone()),
        _ => return Err(BracketError::MatchNotReady(match_id.clone())),
    };
    let winner = decide_series(match_id, m.series_format, &games)?;

    let m = bracket
        .match_by_id_mut(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.clone()))?;
    if m.result.is_some() {
        log::info!("Overwriting result of match {}", match_id);
    }
    m.result = Some(MatchResult {
        games,
        winner,
        side_a_team: team_a,
        side_b_team: team_b,
        recorded_at: Utc::now(),
    });
    m.status = MatchStatus::Completed;
    Ok(winner)
}

/// Remove a recorded result (e.g. a duplicate import). No-op when there is none.
pub fn clear_result(bracket: &mut Bracket, match_id: &MatchId) -> Result<(), BracketError> {
    let m = bracket
        .match_by_id_mut(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.clone()))?;
    if m.result.take().is_some() {
        m.status = MatchStatus::Ready;
    }
    Ok(())
}

/// Change the series format of a match that has no result yet.
pub fn set_match_format(
    bracket: &mut Bracket,
    match_id: &MatchId,
    format: SeriesFormat,
) -> Result<(), BracketError> {
    let m = bracket
        .match_by_id_mut(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.clone()))?;
    if m.result.is_some() {
        return Err(BracketError::ResultAlreadyRecorded(match_id.clone()));
    }
    m.series_format = format;
    Ok(())
}

/// Replace the scheduling metadata of a match.
pub fn set_schedule(
    bracket: &mut Bracket,
    match_id: &MatchId,
    schedule: Schedule,
) -> Result<(), BracketError> {
    let m = bracket
        .match_by_id_mut(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.clone()))?;
    m.schedule = schedule;
    Ok(())
}
