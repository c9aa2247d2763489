//! Integration tests for the bracket service and stores.

mod common;

use common::{series, teams};
use playoff_bracket::{
    Bracket, BracketError, BracketService, BracketStore, FormatPolicy, JsonFileStore, MatchId,
    MatchStatus, MemoryStore, Schedule, SeriesFormat, Side, StoredBracket, TournamentId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

fn bo1() -> FormatPolicy {
    FormatPolicy::uniform(SeriesFormat::Bo1)
}

fn service() -> BracketService {
    BracketService::new(MemoryStore::new(), 3)
}

fn win(side: Side) -> Vec<playoff_bracket::GameScore> {
    series(SeriesFormat::Bo1, side, 0)
}

/// Store that lets another writer sneak in before the first versioned save.
struct RacingStore {
    inner: MemoryStore,
    raced: AtomicBool,
}

impl BracketStore for RacingStore {
    fn load_bracket(&self, id: TournamentId) -> Result<Option<StoredBracket>, BracketError> {
        self.inner.load_bracket(id)
    }

    fn save_bracket(
        &self,
        id: TournamentId,
        bracket: &Bracket,
        expected_version: Option<u64>,
    ) -> Result<u64, BracketError> {
        if expected_version.is_some() && !self.raced.swap(true, Ordering::SeqCst) {
            let current = self.inner.load_bracket(id)?.unwrap();
            self.inner
                .save_bracket(id, &current.bracket, Some(current.version))?;
        }
        self.inner.save_bracket(id, bracket, expected_version)
    }
}

fn racing(retries: u32) -> BracketService {
    BracketService::new(
        RacingStore {
            inner: MemoryStore::new(),
            raced: AtomicBool::new(false),
        },
        retries,
    )
}

#[test]
fn initialize_persists_first_version() {
    let svc = service();
    let id = Uuid::new_v4();
    let stored = svc.initialize(id, teams(8), &bo1()).unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(svc.get_bracket(id).unwrap(), stored);
    assert_eq!(stored.bracket.ready_matches().count(), 4);
}

#[test]
fn initialize_twice_is_rejected() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    assert_eq!(
        svc.initialize(id, teams(4), &bo1()).unwrap_err(),
        BracketError::AlreadyInitialized(id)
    );
}

#[test]
fn construction_errors_persist_nothing() {
    let svc = service();
    let id = Uuid::new_v4();
    assert!(matches!(
        svc.initialize(id, teams(6), &bo1()),
        Err(BracketError::Construction(_))
    ));
    assert_eq!(svc.get_bracket(id).unwrap_err(), BracketError::NotInitialized(id));
}

#[test]
fn submit_result_propagates_and_bumps_version() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    let stored = svc
        .submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::A))
        .unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(
        common::team_in(&stored.bracket, "bracket:upper:round:2:slot:1").as_deref(),
        Some("t1")
    );
    assert_eq!(
        common::team_in(&stored.bracket, "bracket:lower:round:1:slot:1").as_deref(),
        Some("t4")
    );
}

#[test]
fn rejected_submissions_leave_store_untouched() {
    let svc = service();
    let id = Uuid::new_v4();
    let initial = svc.initialize(id, teams(4), &bo1()).unwrap();

    assert_eq!(
        svc.submit_result(id, &MatchId::from("ub-r2-m1"), win(Side::A)),
        Err(BracketError::MatchNotReady(MatchId::from("ub-r2-m1")))
    );
    assert!(matches!(
        svc.submit_result(id, &MatchId::from("ub-r1-m1"), vec![]),
        Err(BracketError::IncompleteSeries { .. })
    ));
    assert!(matches!(
        svc.submit_result(Uuid::new_v4(), &MatchId::from("ub-r1-m1"), win(Side::A)),
        Err(BracketError::NotInitialized(_))
    ));
    assert_eq!(svc.get_bracket(id).unwrap(), initial);
}

#[test]
fn recompute_endpoint_is_idempotent() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    let played = svc
        .submit_result(id, &MatchId::from("ub-r1-m2"), win(Side::B))
        .unwrap();
    let first = svc.recompute(id).unwrap();
    let second = svc.recompute(id).unwrap();
    assert_eq!(first.bracket.matches, played.bracket.matches);
    assert_eq!(first.bracket.slots, played.bracket.slots);
    assert_eq!(second.bracket.matches, first.bracket.matches);
    assert_eq!(second.bracket.slots, first.bracket.slots);
    assert_eq!(second.version, first.version + 1);
}

#[test]
fn concurrent_update_is_retried() {
    let svc = racing(1);
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    let stored = svc
        .submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::A))
        .unwrap();
    // Initial save, the racing writer, then our retried save.
    assert_eq!(stored.version, 3);
    assert_eq!(
        stored.bracket.match_by_id(&MatchId::from("ub-r1-m1")).unwrap().status,
        MatchStatus::Completed
    );
}

#[test]
fn concurrency_error_surfaces_without_retries() {
    let svc = racing(0);
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    assert_eq!(
        svc.submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::A)),
        Err(BracketError::OptimisticConcurrency {
            expected: Some(1),
            actual: Some(2)
        })
    );
}

#[test]
fn parallel_submissions_serialize() {
    let svc = Arc::new(BracketService::new(MemoryStore::new(), 10));
    let id = Uuid::new_v4();
    svc.initialize(id, teams(8), &bo1()).unwrap();

    let handles: Vec<_> = (1..=4)
        .map(|p| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                svc.submit_result(id, &MatchId(format!("ub-r1-m{p}")), win(Side::A))
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stored = svc.get_bracket(id).unwrap();
    assert_eq!(stored.version, 5);
    assert_eq!(
        stored
            .bracket
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .count(),
        4
    );
    assert_eq!(stored.bracket.ready_matches().count(), 4);
}

#[test]
fn clear_result_reverts_downstream() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    svc.submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::A)).unwrap();
    svc.submit_result(id, &MatchId::from("ub-r1-m2"), win(Side::A)).unwrap();
    svc.submit_result(id, &MatchId::from("ub-r2-m1"), win(Side::A)).unwrap();

    let stored = svc.clear_result(id, &MatchId::from("ub-r1-m1")).unwrap();
    let b = &stored.bracket;
    assert_eq!(b.match_by_id(&MatchId::from("ub-r1-m1")).unwrap().status, MatchStatus::Ready);
    let final_match = b.match_by_id(&MatchId::from("ub-r2-m1")).unwrap();
    assert_eq!(final_match.status, MatchStatus::WaitingForTeams);
    assert!(final_match.result.is_none());
}

#[test]
fn format_and_schedule_updates() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(4), &bo1()).unwrap();
    let m = MatchId::from("ub-r1-m1");

    let stored = svc.set_match_format(id, &m, SeriesFormat::Bo3).unwrap();
    assert_eq!(stored.bracket.match_by_id(&m).unwrap().series_format, SeriesFormat::Bo3);

    let when = chrono::Utc::now();
    let stored = svc
        .set_schedule(
            id,
            &m,
            Schedule {
                scheduled_at: Some(when),
                live: true,
            },
        )
        .unwrap();
    let schedule = &stored.bracket.match_by_id(&m).unwrap().schedule;
    assert_eq!(schedule.scheduled_at, Some(when));
    assert!(schedule.live);

    svc.submit_result(id, &m, series(SeriesFormat::Bo3, Side::A, 1)).unwrap();
    assert_eq!(
        svc.set_match_format(id, &m, SeriesFormat::Bo1),
        Err(BracketError::ResultAlreadyRecorded(m.clone()))
    );
}

#[test]
fn standings_through_service() {
    let svc = service();
    let id = Uuid::new_v4();
    svc.initialize(id, teams(2), &bo1()).unwrap();
    svc.submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::A)).unwrap();
    svc.submit_result(id, &MatchId::from("gf-r1-m1"), win(Side::A)).unwrap();
    let table = svc.standings(id).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].team.id.as_str(), "t1");
    assert_eq!(table[1].place, 2);
    assert_eq!(table[1].eliminated_in, Some(MatchId::from("gf-r1-m1")));
}

#[test]
fn json_file_store_round_trips_and_checks_versions() {
    let dir = std::env::temp_dir().join(format!("playoff-bracket-test-{}", Uuid::new_v4()));
    let id = Uuid::new_v4();
    {
        let svc = BracketService::new(JsonFileStore::open(&dir).unwrap(), 3);
        svc.initialize(id, teams(4), &bo1()).unwrap();
        svc.submit_result(id, &MatchId::from("ub-r1-m1"), win(Side::B)).unwrap();
    }

    let store = JsonFileStore::open(&dir).unwrap();
    let stored = store.load_bracket(id).unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(
        common::team_in(&stored.bracket, "bracket:upper:round:2:slot:1").as_deref(),
        Some("t4")
    );
    assert!(store.load_bracket(Uuid::new_v4()).unwrap().is_none());
    assert_eq!(
        store.save_bracket(id, &stored.bracket, Some(1)),
        Err(BracketError::OptimisticConcurrency {
            expected: Some(1),
            actual: Some(2)
        })
    );
    assert_eq!(store.save_bracket(id, &stored.bracket, Some(2)), Ok(3));

    let files: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec![format!("{id}.json")]);

    std::fs::remove_dir_all(&dir).unwrap();
}
