use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::error::{AppError, AppResult};
use super::extract::{
    double_option, optional_id, required_id, ApiJson, ApiPath, ApiQuery, AuthUser,
};
use super::AppState;
use crate::auth::Capability;
use crate::results::{tally_result, GoalEntry};
use crate::store::{MatchChanges, MatchDetail, NewMatch};
use crate::types::{Match, Season};
use crate::utils::clean_optional;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    #[serde(rename = "temporadaId")]
    season_id: Option<String>,
    #[serde(rename = "jornada")]
    round: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(rename = "temporadaId")]
    season_id: Option<i64>,
    #[serde(rename = "equipoLocalId")]
    home_team_id: Option<i64>,
    #[serde(rename = "equipoVisitaId")]
    away_team_id: Option<i64>,
    #[serde(rename = "jornada")]
    round: Option<i32>,
    #[serde(rename = "fecha")]
    kickoff: Option<String>,
    #[serde(rename = "cancha", default, deserialize_with = "double_option")]
    pitch: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    #[serde(rename = "goles")]
    goals: Option<Vec<GoalEntry>>,
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM[:SS]` (taken as
/// UTC) and bare dates (midnight UTC).
fn parse_kickoff(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::bad_request(format!("fecha '{}' is not a valid date", raw)))
}

fn positive_round(round: i32) -> AppResult<i32> {
    if round > 0 {
        Ok(round)
    } else {
        Err(AppError::bad_request("jornada must be a positive integer"))
    }
}

async fn match_in_season(state: &AppState, id: i64) -> AppResult<(Match, Season)> {
    let game = state
        .store
        .get_match(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;
    let season = state.season(game.season_id).await?;
    Ok((game, season))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MatchQuery>,
) -> AppResult<Json<Vec<MatchDetail>>> {
    let season_id = required_id(query.season_id.as_deref(), "temporadaId")?;
    let round = optional_id(query.round.as_deref(), "jornada")?
        .map(|r| i32::try_from(r).map_err(|_| AppError::bad_request("jornada is out of range")))
        .transpose()?;
    let matches = state.store.list_matches(season_id, round).await?;
    debug!("Listing {} matches of season {}", matches.len(), season_id);
    Ok(Json(matches))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<MatchRequest>,
) -> AppResult<(StatusCode, Json<MatchDetail>)> {
    let (Some(season_id), Some(home_team_id), Some(away_team_id), Some(round), Some(kickoff)) = (
        request.season_id,
        request.home_team_id,
        request.away_team_id,
        request.round,
        request.kickoff.as_deref(),
    ) else {
        return Err(AppError::bad_request(
            "temporadaId, equipoLocalId, equipoVisitaId, jornada and fecha are required",
        ));
    };
    if home_team_id == away_team_id {
        return Err(AppError::bad_request("A team cannot play against itself"));
    }
    let round = positive_round(round)?;
    let kickoff = parse_kickoff(kickoff)?;

    let season = state.season(season_id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let (home, away) = (
        state.store.get_team(home_team_id).await?,
        state.store.get_team(away_team_id).await?,
    );
    let (Some(home), Some(away)) = (home, away) else {
        return Err(AppError::NotFound("Home or away team not found".to_string()));
    };
    if home.season_id != season_id || away.season_id != season_id {
        return Err(AppError::bad_request("Both teams must belong to the match's season"));
    }

    let game = state
        .store
        .insert_match(NewMatch {
            season_id,
            home_team_id,
            away_team_id,
            round,
            kickoff,
            pitch: clean_optional(request.pitch.flatten().as_deref()),
        })
        .await?;
    info!(
        "Scheduled match {}: {} vs {} (round {})",
        game.game.id, home.name, away.name, round
    );
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<MatchRequest>,
) -> AppResult<Json<Match>> {
    let (_, season) = match_in_season(&state, id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let changes = MatchChanges {
        round: request.round.map(positive_round).transpose()?,
        kickoff: request.kickoff.as_deref().map(parse_kickoff).transpose()?,
        pitch: request.pitch.map(|p| clean_optional(p.as_deref())),
    };
    let game = state.store.update_match(id, changes).await?;
    info!("Updated match {}", id);
    Ok(Json(game))
}

pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    let (_, season) = match_in_season(&state, id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;
    state.store.delete_match(id).await?;
    info!("Deleted match {}", id);
    Ok(Json(json!({ "message": "Match deleted" })))
}

pub async fn register_result(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ResultRequest>,
) -> AppResult<Json<MatchDetail>> {
    let entries = request
        .goals
        .ok_or_else(|| AppError::bad_request("goles must be a list of { jugadoraId, minuto? }"))?;

    let (game, season) = match_in_season(&state, id).await?;
    caller.require(Capability::RecordResults(season.league_id))?;

    let player_ids: Vec<i64> = entries
        .iter()
        .map(|e| e.player_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let players = state.store.find_players(&player_ids).await?;
    let tally = tally_result(&game, &players, &entries)?;

    let detail = state
        .store
        .record_result(id, tally.home_goals, tally.away_goals, tally.goals)
        .await?;
    info!(
        "Match {} result registered: {}-{}",
        id, detail.game.home_goals, detail.game.away_goals
    );
    Ok(Json(detail))
}
