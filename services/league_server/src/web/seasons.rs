use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{AppError, AppResult};
use super::extract::{
    double_option, required_id, required_text, ApiJson, ApiPath, ApiQuery, AuthUser,
};
use super::AppState;
use crate::auth::Capability;
use crate::store::{NewSeason, SeasonChanges};
use crate::types::Season;

#[derive(Debug, Deserialize)]
pub struct SeasonQuery {
    #[serde(rename = "ligaId")]
    league_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonRequest {
    #[serde(rename = "ligaId")]
    league_id: Option<i64>,
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde(rename = "anio")]
    year: Option<i32>,
    #[serde(rename = "fechaInicio", default, deserialize_with = "double_option")]
    starts_on: Option<Option<NaiveDate>>,
    #[serde(rename = "fechaFin", default, deserialize_with = "double_option")]
    ends_on: Option<Option<NaiveDate>>,
    #[serde(rename = "activa")]
    active: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SeasonQuery>,
) -> AppResult<Json<Vec<Season>>> {
    let league_id = required_id(query.league_id.as_deref(), "ligaId")?;
    let seasons = state.store.list_seasons(league_id).await?;
    debug!("Listing {} seasons of league {}", seasons.len(), league_id);
    Ok(Json(seasons))
}

pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<Season>> {
    Ok(Json(state.season(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<SeasonRequest>,
) -> AppResult<(StatusCode, Json<Season>)> {
    let league_id = request
        .league_id
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("ligaId is required"))?;
    let name = required_text(request.name, "nombre")?;
    let year = request
        .year
        .filter(|y| *y > 0)
        .ok_or_else(|| AppError::bad_request("anio is required"))?;

    caller.require(Capability::ManageLeague(league_id))?;
    if state.store.get_league(league_id).await?.is_none() {
        return Err(AppError::NotFound("League not found".to_string()));
    }

    let season = state
        .store
        .insert_season(NewSeason {
            league_id,
            name,
            year,
            starts_on: request.starts_on.flatten(),
            ends_on: request.ends_on.flatten(),
            active: request.active.unwrap_or(true),
        })
        .await?;
    info!("Created season {} '{}' in league {}", season.id, season.name, league_id);
    Ok((StatusCode::CREATED, Json(season)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<SeasonRequest>,
) -> AppResult<Json<Season>> {
    let season = state.season(id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;

    let changes = SeasonChanges {
        name: request.name.map(|n| required_text(Some(n), "nombre")).transpose()?,
        year: request.year,
        starts_on: request.starts_on,
        ends_on: request.ends_on,
        active: request.active,
    };
    let updated = state.store.update_season(id, changes).await?;
    info!("Updated season {}", id);
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    let season = state.season(id).await?;
    caller.require(Capability::ManageLeague(season.league_id))?;
    state.store.delete_season(id).await?;
    info!("Deleted season {}", id);
    Ok(Json(json!({ "message": "Season deleted" })))
}
