//! JSON API served under `/api`.

mod auth;
mod error;
mod extract;
mod leagues;
mod matches;
mod players;
mod seasons;
mod stats;
mod teams;

pub use error::{AppError, AppResult};
pub use extract::AuthUser;

use axum::{
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::auth::{login_limiter, prune_login_limiter, LoginLimiter, SessionSigner};
use crate::config::{AppConfig, ServerConfig};
use crate::metrics::{track_requests, MetricsCollector, RequestMetrics};
use crate::store::LeagueStore;
use crate::types::{Season, Team};

const LIMITER_PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeagueStore>,
    pub signer: Arc<SessionSigner>,
    pub login_limiter: Arc<LoginLimiter>,
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(store: Arc<dyn LeagueStore>, config: &AppConfig) -> Self {
        let session = &config.session;
        Self {
            store,
            signer: Arc::new(SessionSigner::new(
                session.secret.as_bytes(),
                Duration::try_hours(session.session_ttl_hours).unwrap_or(Duration::MAX),
                Duration::try_hours(session.visitor_ttl_hours).unwrap_or(Duration::MAX),
            )),
            login_limiter: Arc::new(login_limiter(session.login_attempts_per_minute)),
            metrics: MetricsCollector::new(),
        }
    }

    async fn season(&self, id: i64) -> AppResult<Season> {
        self.store
            .get_season(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Season not found".to_string()))
    }

    /// A team together with the season (and so the league) it belongs to.
    async fn team_in_season(&self, id: i64) -> AppResult<(Team, Season)> {
        let team = self
            .store
            .get_team(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
        let season = self.season(team.season_id).await?;
        Ok((team, season))
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    metrics: RequestMetrics,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        metrics: state.metrics.get_metrics(),
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/visitor-token", post(auth::visitor_token))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/league-admin", post(auth::create_league_admin))
        .route("/api/auth/users", get(auth::list_users).post(auth::create_user))
        .route("/api/auth/users/{id}", delete(auth::delete_user))
        .route("/api/ligas", get(leagues::list).post(leagues::create))
        .route(
            "/api/ligas/{id}",
            get(leagues::show).put(leagues::update).delete(leagues::remove),
        )
        .route("/api/temporadas", get(seasons::list).post(seasons::create))
        .route(
            "/api/temporadas/{id}",
            get(seasons::show).put(seasons::update).delete(seasons::remove),
        )
        .route("/api/equipos", get(teams::list).post(teams::create))
        .route(
            "/api/equipos/{id}",
            get(teams::show).put(teams::update).delete(teams::remove),
        )
        .route("/api/jugadoras", get(players::list).post(players::create))
        .route(
            "/api/jugadoras/{id}",
            get(players::show).put(players::update).delete(players::remove),
        )
        .route("/api/partidos", get(matches::list).post(matches::create))
        .route(
            "/api/partidos/{id}",
            put(matches::update).delete(matches::remove),
        )
        .route("/api/partidos/{id}/resultado", post(matches::register_result))
        .route("/api/estadisticas/tabla", get(stats::standings))
        .route("/api/estadisticas/goleo", get(stats::scorers))
        .route("/api/standings", get(stats::standings))
        .route("/api/scorers", get(stats::scorers))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// Periodically forgets login identifiers whose quota has replenished.
fn spawn_limiter_pruning(limiter: Arc<LoginLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            let tracked = prune_login_limiter(&*limiter);
            debug!("Login limiter tracking {} identifiers", tracked);
        }
    })
}

pub async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let pruning = spawn_limiter_pruning(state.login_limiter.clone());
    let app = router(state, &config.cors_origins);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("League API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    pruning.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl-C, shutting down");
    }
}
