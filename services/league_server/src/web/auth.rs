use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::error::{AppError, AppResult};
use super::extract::{required_text, ApiJson, ApiPath, AuthUser};
use super::AppState;
use crate::auth::{hash_password, verify_password, Capability};
use crate::store::NewUser;
use crate::types::{Role, User};
use crate::utils::{fold_name, is_valid_email, normalize_email};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    token: String,
    user: Value,
}

/// Runs bcrypt off the async workers.
async fn blocking<T, F>(work: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let identifier = request
        .username
        .or(request.email)
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty());
    let (Some(identifier), Some(password)) = (identifier, request.password) else {
        return Err(AppError::bad_request("username and password are required"));
    };

    if state.login_limiter.check_key(&fold_name(&identifier)).is_err() {
        warn!("Login rate limit hit for '{}'", identifier);
        return Err(AppError::TooManyRequests);
    }

    let user = match state.store.find_user_by_login(&identifier).await? {
        Some(user) if user.active => user,
        _ => {
            warn!("Rejected login for unknown or inactive user '{}'", identifier);
            return Err(invalid_credentials());
        }
    };
    let stored = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &stored)).await?? {
        warn!("Rejected login for '{}': wrong password", identifier);
        return Err(invalid_credentials());
    }

    let token = state.signer.issue_for(&user, Utc::now())?;
    info!("User {} logged in as {:?}", user.id, user.role);
    Ok(Json(SessionResponse {
        token,
        user: json!(user),
    }))
}

pub async fn visitor_token(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let token = state.signer.issue_visitor(Utc::now())?;
    Ok(Json(SessionResponse {
        token,
        user: json!({ "role": Role::Visitor, "nombre": "Visitante", "ligaId": null }),
    }))
}

pub async fn me(State(state): State<AppState>, AuthUser(claims): AuthUser) -> AppResult<Json<User>> {
    let stale = || AppError::Unauthorized("Session is no longer valid".to_string());
    let user_id = claims.sub.ok_or_else(stale)?;
    match state.store.get_user(user_id).await? {
        Some(user) if user.active => Ok(Json(user)),
        _ => Err(stale()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    email: Option<String>,
    #[serde(rename = "nombre")]
    name: Option<String>,
    password: Option<String>,
    role: Option<Role>,
    #[serde(rename = "ligaId")]
    league_id: Option<i64>,
}

async fn create_account(
    state: &AppState,
    request: CreateUserRequest,
    role: Role,
) -> AppResult<(StatusCode, Json<User>)> {
    let email = normalize_email(&required_text(request.email, "email")?);
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("email is not valid"));
    }
    let name = required_text(request.name, "nombre")?;
    let password = required_text(request.password, "password")?;

    let league_id = match role {
        Role::SuperAdmin => None,
        Role::LeagueAdmin | Role::Scorekeeper => {
            let league_id = request
                .league_id
                .filter(|id| *id > 0)
                .ok_or_else(|| AppError::bad_request("ligaId is required for this role"))?;
            if state.store.get_league(league_id).await?.is_none() {
                return Err(AppError::NotFound("League not found".to_string()));
            }
            Some(league_id)
        }
        Role::Visitor => return Err(AppError::bad_request("Visitors do not have accounts")),
    };

    let password_hash = blocking(move || hash_password(&password)).await??;
    let user = state
        .store
        .insert_user(NewUser {
            email,
            name,
            password_hash,
            role,
            league_id,
        })
        .await?;
    info!("Created {:?} account {} ({})", user.role, user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_league_admin(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    caller.require(Capability::ManageUsers)?;
    create_account(&state, request, Role::LeagueAdmin).await
}

pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    caller.require(Capability::ManageUsers)?;
    let role = request
        .role
        .ok_or_else(|| AppError::bad_request("role is required"))?;
    create_account(&state, request, role).await
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<Vec<User>>> {
    caller.require(Capability::ManageUsers)?;
    Ok(Json(state.store.list_users().await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    caller.require(Capability::ManageUsers)?;
    if caller.0.sub == Some(id) {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }
    state.store.delete_user(id).await?;
    info!("Deleted user {}", id);
    Ok(Json(json!({ "message": "User deleted" })))
}
