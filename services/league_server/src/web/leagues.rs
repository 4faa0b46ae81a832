use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{AppError, AppResult};
use super::extract::{double_option, required_text, ApiJson, ApiPath, AuthUser};
use super::AppState;
use crate::auth::Capability;
use crate::store::{LeagueChanges, NewLeague};
use crate::types::{League, Season};
use crate::utils::clean_optional;

#[derive(Debug, Serialize)]
pub struct LeagueDetail {
    #[serde(flatten)]
    league: League,
    /// Active seasons, newest first.
    #[serde(rename = "temporadas")]
    seasons: Vec<Season>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueRequest {
    #[serde(rename = "nombre")]
    name: Option<String>,
    #[serde(rename = "tipo")]
    kind: Option<String>,
    #[serde(rename = "ciudad", default, deserialize_with = "double_option")]
    city: Option<Option<String>>,
    #[serde(rename = "activa")]
    active: Option<bool>,
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<League>>> {
    let leagues = state.store.list_leagues().await?;
    debug!("Listing {} leagues", leagues.len());
    Ok(Json(leagues))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LeagueDetail>> {
    let league = state
        .store
        .get_league(id)
        .await?
        .ok_or_else(|| AppError::NotFound("League not found".to_string()))?;
    let mut seasons: Vec<Season> = state
        .store
        .list_seasons(id)
        .await?
        .into_iter()
        .filter(|s| s.active)
        .collect();
    seasons.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.name.cmp(&b.name)));
    Ok(Json(LeagueDetail { league, seasons }))
}

pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<LeagueRequest>,
) -> AppResult<(StatusCode, Json<League>)> {
    caller.require(Capability::ManageLeagues)?;
    let league = state
        .store
        .insert_league(NewLeague {
            name: required_text(request.name, "nombre")?,
            kind: required_text(request.kind, "tipo")?,
            city: clean_optional(request.city.flatten().as_deref()),
        })
        .await?;
    info!("Created league {} '{}'", league.id, league.name);
    Ok((StatusCode::CREATED, Json(league)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<LeagueRequest>,
) -> AppResult<Json<League>> {
    caller.require(Capability::ManageLeagues)?;
    let changes = LeagueChanges {
        name: request.name.map(|n| required_text(Some(n), "nombre")).transpose()?,
        kind: request.kind.map(|k| required_text(Some(k), "tipo")).transpose()?,
        city: request.city.map(|c| clean_optional(c.as_deref())),
        active: request.active,
    };
    let league = state.store.update_league(id, changes).await?;
    info!("Updated league {}", id);
    Ok(Json(league))
}

pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    caller.require(Capability::ManageLeagues)?;
    state.store.delete_league(id).await?;
    info!("Deleted league {}", id);
    Ok(Json(json!({ "message": "League deleted" })))
}
