//! REST API over the bracket service. Mounted by the `web` binary via [`configure`].

use crate::logic::FormatPolicy;
use crate::models::{BracketError, GameScore, MatchId, Schedule, SeriesFormat, TeamRef, TournamentId};
use crate::service::BracketService;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    HttpResponse, Responder,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub type AppState = Data<BracketService>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct InitializeBody {
    teams: Vec<TeamRef>,
    #[serde(default)]
    formats: FormatPolicy,
}

#[derive(Deserialize)]
struct ResultBody {
    scores: Vec<GameScore>,
}

#[derive(Deserialize)]
struct FormatBody {
    format: SeriesFormat,
}

#[derive(Deserialize)]
struct ScheduleBody {
    scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    live: bool,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id (e.g. /api/tournaments/{id}/matches/{match_id})
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: String,
}

/// Status code per error kind; body is `{ "error": message }`.
pub fn error_response(e: &BracketError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        BracketError::Construction(_) => HttpResponse::BadRequest().json(body),
        BracketError::IncompleteSeries { .. }
        | BracketError::InvalidScore { .. }
        | BracketError::ResultAlreadyRecorded(_)
        | BracketError::AlreadyInitialized(_)
        | BracketError::OptimisticConcurrency { .. } => HttpResponse::Conflict().json(body),
        BracketError::MatchNotFound(_)
        | BracketError::MatchNotReady(_)
        | BracketError::NotInitialized(_) => HttpResponse::NotFound().json(body),
        BracketError::SlotConflict { .. } | BracketError::Storage(_) => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "playoff-bracket",
    })
}

/// Current bracket (404 if not initialized).
#[get("/api/tournaments/{id}/bracket")]
async fn api_get_bracket(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.get_bracket(path.id) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

/// Build the bracket from the ranked qualifier list (409 if one exists).
#[post("/api/tournaments/{id}/initialize")]
async fn api_initialize(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<InitializeBody>,
) -> HttpResponse {
    let InitializeBody { teams, formats } = body.into_inner();
    match state.initialize(path.id, teams, &formats) {
        Ok(stored) => HttpResponse::Created().json(stored),
        Err(e) => error_response(&e),
    }
}

/// Record or correct a series result.
#[post("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_submit_result(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    let match_id = MatchId(path.match_id.clone());
    match state.submit_result(path.id, &match_id, body.into_inner().scores) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

/// Remove a recorded result (e.g. a duplicate import).
#[delete("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_clear_result(state: AppState, path: Path<TournamentMatchPath>) -> HttpResponse {
    let match_id = MatchId(path.match_id.clone());
    match state.clear_result(path.id, &match_id) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

#[put("/api/tournaments/{id}/matches/{match_id}/format")]
async fn api_set_format(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<FormatBody>,
) -> HttpResponse {
    let match_id = MatchId(path.match_id.clone());
    match state.set_match_format(path.id, &match_id, body.format) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

#[put("/api/tournaments/{id}/matches/{match_id}/schedule")]
async fn api_set_schedule(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<ScheduleBody>,
) -> HttpResponse {
    let match_id = MatchId(path.match_id.clone());
    let schedule = Schedule {
        scheduled_at: body.scheduled_at,
        live: body.live,
    };
    match state.set_schedule(path.id, &match_id, schedule) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

/// Matches with both teams known and no result yet.
#[get("/api/tournaments/{id}/matches/ready")]
async fn api_ready_matches(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.get_bracket(path.id) {
        Ok(stored) => {
            let ready: Vec<_> = stored.bracket.ready_matches().cloned().collect();
            HttpResponse::Ok().json(ready)
        }
        Err(e) => error_response(&e),
    }
}

/// Re-derive every slot from recorded results. Idempotent.
#[post("/api/tournaments/{id}/recompute")]
async fn api_recompute(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.recompute(path.id) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.standings(path.id) {
        Ok(table) => HttpResponse::Ok().json(table),
        Err(e) => error_response(&e),
    }
}

/// Register all routes. The caller provides the `BracketService` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_get_bracket)
        .service(api_initialize)
        .service(api_submit_result)
        .service(api_clear_result)
        .service(api_set_format)
        .service(api_set_schedule)
        .service(api_ready_matches)
        .service(api_recompute)
        .service(api_standings);
}
