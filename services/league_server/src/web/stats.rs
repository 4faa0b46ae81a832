use axum::{extract::State, Json};
use serde::Deserialize;

use super::error::AppResult;
use super::extract::{required_id, ApiQuery};
use super::AppState;
use crate::report::{season_scorers, season_standings};
use crate::scorers::ScorerRow;
use crate::standings::StandingsRow;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(rename = "temporadaId", alias = "seasonId")]
    season_id: Option<String>,
}

pub async fn standings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<Vec<StandingsRow>>> {
    let season_id = required_id(query.season_id.as_deref(), "temporadaId")?;
    Ok(Json(season_standings(state.store.as_ref(), season_id).await?))
}

pub async fn scorers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<Vec<ScorerRow>>> {
    let season_id = required_id(query.season_id.as_deref(), "temporadaId")?;
    Ok(Json(season_scorers(state.store.as_ref(), season_id).await?))
}
