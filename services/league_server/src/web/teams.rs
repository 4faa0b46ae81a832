use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{AppError, AppResult};
use super::extract::{
    double_option, required_id, required_text, ApiJson, ApiPath, ApiQuery, AuthUser,
};
use super::AppState;
use crate::auth::Capability;
use crate::store::{NewTeam, PlayerFilter, TeamChanges, TeamSummary};
use crate::types::{Player, Season, Team};
use crate::utils::clean_optional;

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    #[serde(rename = "temporadaId")]
    season_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    #[serde(rename = "temporadaId")]
    season_id: Option<i64>,
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde(rename = "escudoUrl", default, deserialize_with = "double_option")]
    crest_url: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    team: Team,
    #[serde(rename = "temporada")]
    season: Season,
    /// Active players by name.
    #[serde(rename = "jugadoras")]
    players: Vec<Player>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TeamQuery>,
) -> AppResult<Json<Vec<TeamSummary>>> {
    let season_id = required_id(query.season_id.as_deref(), "temporadaId")?;
    let teams = state.store.list_teams(season_id).await?;
    debug!("Listing {} teams of season {}", teams.len(), season_id);
    Ok(Json(teams))
}

pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<TeamDetail>> {
    let (team, season) = state.team_in_season(id).await?;
    let players = state
        .store
        .list_players(PlayerFilter {
            team_id: Some(team.id),
            season_id: None,
        })
        .await?
        .into_iter()
        .map(|detail| detail.player)
        .collect();
    Ok(Json(TeamDetail {
        team,
        season,
        players,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<TeamRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    let season_id = request
        .season_id
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("temporadaId is required"))?;
    let name = required_text(request.name, "nombre")?;

    let season = state.season(season_id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let team = state
        .store
        .insert_team(NewTeam {
            season_id,
            name,
            crest_url: clean_optional(request.crest_url.flatten().as_deref()),
        })
        .await?;
    info!("Created team {} '{}' in season {}", team.id, team.name, season_id);
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<TeamRequest>,
) -> AppResult<Json<Team>> {
    let (_, season) = state.team_in_season(id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let changes = TeamChanges {
        name: request.name.map(|n| required_text(Some(n), "nombre")).transpose()?,
        crest_url: request.crest_url.map(|c| clean_optional(c.as_deref())),
    };
    let team = state.store.update_team(id, changes).await?;
    info!("Updated team {}", id);
    Ok(Json(team))
}

pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    let (_, season) = state.team_in_season(id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;
    state.store.delete_team(id).await?;
    info!("Deleted team {}", id);
    Ok(Json(json!({ "message": "Team deleted" })))
}
