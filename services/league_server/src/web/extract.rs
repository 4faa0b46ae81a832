use axum::{
    extract::{FromRequest, FromRequestParts},
    http::header::AUTHORIZATION,
    http::request::Parts,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer};

use super::error::{AppError, AppResult};
use super::AppState;
use crate::auth::{Capability, Claims};

/// Caller authenticated by a bearer session token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.0.can(capability) {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not allowed to do this"))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        let claims = state.signer.verify(token, Utc::now())?;
        Ok(AuthUser(claims))
    }
}

/// JSON body whose rejections answer with the `{"message"}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parses an id query parameter. Missing, zero and non-numeric values are
/// rejected.
pub fn required_id(value: Option<&str>, name: &str) -> AppResult<i64> {
    optional_id(value, name)?.ok_or_else(|| AppError::bad_request(format!("{} is required", name)))
}

pub fn optional_id(value: Option<&str>, name: &str) -> AppResult<Option<i64>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i64>() {
            Ok(0) => Ok(None),
            Ok(id) if id > 0 => Ok(Some(id)),
            _ => Err(AppError::bad_request(format!("{} must be a positive integer", name))),
        },
    }
}

/// Requires a non-blank string field.
pub fn required_text(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{} is required", name)))
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
