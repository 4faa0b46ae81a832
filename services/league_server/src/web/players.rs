use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{AppError, AppResult};
use super::extract::{
    double_option, optional_id, required_text, ApiJson, ApiPath, ApiQuery, AuthUser,
};
use super::AppState;
use crate::auth::Capability;
use crate::store::{NewPlayer, PlayerChanges, PlayerDetail, PlayerFilter};
use crate::types::{Player, Season};

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    #[serde(rename = "equipoId")]
    team_id: Option<String>,
    #[serde(rename = "temporadaId")]
    season_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    #[serde(rename = "equipoId")]
    team_id: Option<i64>,
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde(rename = "dorsal", default, deserialize_with = "double_option")]
    shirt_number: Option<Option<i32>>,
    #[serde(rename = "activa")]
    active: Option<bool>,
}

async fn player_in_season(state: &AppState, id: i64) -> AppResult<(Player, Season)> {
    let player = state
        .store
        .get_player(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;
    let (_, season) = state.team_in_season(player.team_id).await?;
    Ok((player, season))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PlayerQuery>,
) -> AppResult<Json<Vec<PlayerDetail>>> {
    let filter = PlayerFilter {
        team_id: optional_id(query.team_id.as_deref(), "equipoId")?,
        season_id: optional_id(query.season_id.as_deref(), "temporadaId")?,
    };
    let players = state.store.list_players(filter).await?;
    debug!("Listing {} players for {:?}", players.len(), filter);
    Ok(Json(players))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<PlayerDetail>> {
    let player = state
        .store
        .get_player(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;
    let (team, _) = state.team_in_season(player.team_id).await?;
    Ok(Json(PlayerDetail { player, team }))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<PlayerRequest>,
) -> AppResult<(StatusCode, Json<Player>)> {
    let team_id = request
        .team_id
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("equipoId is required"))?;
    let name = required_text(request.name, "nombre")?;

    let (_, season) = state.team_in_season(team_id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let player = state
        .store
        .insert_player(NewPlayer {
            team_id,
            name,
            shirt_number: request.shirt_number.flatten(),
        })
        .await?;
    info!("Created player {} '{}' in team {}", player.id, player.name, team_id);
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<PlayerRequest>,
) -> AppResult<Json<Player>> {
    let (_, season) = player_in_season(&state, id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let changes = PlayerChanges {
        name: request.name.map(|n| required_text(Some(n), "nombre")).transpose()?,
        shirt_number: request.shirt_number,
        active: request.active,
    };
    let player = state.store.update_player(id, changes).await?;
    info!("Updated player {}", id);
    Ok(Json(player))
}

/// Players are never removed, only deactivated, so their goals stay on record.
pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    let (_, season) = player_in_season(&state, id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;
    state
        .store
        .update_player(
            id,
            PlayerChanges {
                active: Some(false),
                ..PlayerChanges::default()
            },
        )
        .await?;
    info!("Deactivated player {}", id);
    Ok(Json(json!({ "message": "Player deactivated" })))
}
