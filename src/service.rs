//! Bracket service: the only component that talks to the store.
//!
//! Every mutation is load → pure transform → versioned save. If another writer got in between,
//! the whole cycle is retried against the fresh bracket.

use crate::logic::{self, FormatPolicy};
use crate::models::{
    Bracket, BracketError, GameScore, MatchId, Schedule, SeriesFormat, Standing, TeamRef,
    TournamentId,
};
use crate::store::{BracketStore, StoredBracket};
use chrono::Utc;

pub struct BracketService {
    store: Box<dyn BracketStore>,
    /// Extra attempts after an optimistic-concurrency failure.
    save_retries: u32,
}

impl BracketService {
    pub fn new(store: impl BracketStore + 'static, save_retries: u32) -> Self {
        Self {
            store: Box::new(store),
            save_retries,
        }
    }

    /// Build and persist a fresh bracket. Fails if the tournament already has one.
    pub fn initialize(
        &self,
        tournament_id: TournamentId,
        teams: Vec<TeamRef>,
        policy: &FormatPolicy,
    ) -> Result<StoredBracket, BracketError> {
        if self.store.load_bracket(tournament_id)?.is_some() {
            return Err(BracketError::AlreadyInitialized(tournament_id));
        }
        let bracket = logic::build_bracket(tournament_id, teams, policy)?;
        let version = match self.store.save_bracket(tournament_id, &bracket, None) {
            Ok(v) => v,
            Err(BracketError::OptimisticConcurrency { .. }) => {
                return Err(BracketError::AlreadyInitialized(tournament_id))
            }
            Err(e) => return Err(e),
        };
        log::info!(
            "Initialized bracket for tournament {} with {} teams ({} matches)",
            tournament_id,
            bracket.teams.len(),
            bracket.matches.len()
        );
        Ok(StoredBracket { version, bracket })
    }

    pub fn get_bracket(&self, tournament_id: TournamentId) -> Result<StoredBracket, BracketError> {
        self.store
            .load_bracket(tournament_id)?
            .ok_or(BracketError::NotInitialized(tournament_id))
    }

    /// Record (or correct) a series result and propagate it.
    pub fn submit_result(
        &self,
        tournament_id: TournamentId,
        match_id: &MatchId,
        games: Vec<GameScore>,
    ) -> Result<StoredBracket, BracketError> {
        let stored = self.update(tournament_id, |b| {
            logic::record_result(b, match_id, games.clone()).map(|_| ())
        })?;
        log::info!(
            "Recorded result for match {} in tournament {} (version {})",
            match_id,
            tournament_id,
            stored.version
        );
        if stored.bracket.is_complete {
            if let Some(champion) = &stored.bracket.champion {
                log::info!("Tournament {} complete, champion {}", tournament_id, champion.name);
            }
        }
        Ok(stored)
    }

    /// Remove a recorded result; everything downstream is re-derived.
    pub fn clear_result(
        &self,
        tournament_id: TournamentId,
        match_id: &MatchId,
    ) -> Result<StoredBracket, BracketError> {
        let stored = self.update(tournament_id, |b| logic::clear_result(b, match_id))?;
        log::info!("Cleared result of match {} in tournament {}", match_id, tournament_id);
        Ok(stored)
    }

    pub fn set_match_format(
        &self,
        tournament_id: TournamentId,
        match_id: &MatchId,
        format: SeriesFormat,
    ) -> Result<StoredBracket, BracketError> {
        self.update(tournament_id, |b| logic::set_match_format(b, match_id, format))
    }

    pub fn set_schedule(
        &self,
        tournament_id: TournamentId,
        match_id: &MatchId,
        schedule: Schedule,
    ) -> Result<StoredBracket, BracketError> {
        self.update(tournament_id, |b| logic::set_schedule(b, match_id, schedule.clone()))
    }

    /// Re-derive the bracket from its recorded results. Safe to call at any time.
    pub fn recompute(&self, tournament_id: TournamentId) -> Result<StoredBracket, BracketError> {
        let stored = self.update(tournament_id, |_| Ok(()))?;
        log::info!("Recomputed bracket for tournament {}", tournament_id);
        Ok(stored)
    }

    pub fn standings(&self, tournament_id: TournamentId) -> Result<Vec<Standing>, BracketError> {
        let stored = self.get_bracket(tournament_id)?;
        Ok(logic::standings(&stored.bracket))
    }

    fn update<F>(&self, tournament_id: TournamentId, op: F) -> Result<StoredBracket, BracketError>
    where
        F: Fn(&mut Bracket) -> Result<(), BracketError>,
    {
        let mut attempt = 0;
        loop {
            let stored = self.get_bracket(tournament_id)?;
            let mut bracket = stored.bracket;
            op(&mut bracket)?;
            let mut bracket = logic::recompute(&bracket)?;
            bracket.updated_at = Utc::now();
            match self
                .store
                .save_bracket(tournament_id, &bracket, Some(stored.version))
            {
                Ok(version) => return Ok(StoredBracket { version, bracket }),
                Err(BracketError::OptimisticConcurrency { expected, actual })
                    if attempt < self.save_retries =>
                {
                    attempt += 1;
                    log::warn!(
                        "Concurrent update on tournament {} (expected {:?}, found {:?}), retry {}",
                        tournament_id,
                        expected,
                        actual,
                        attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
