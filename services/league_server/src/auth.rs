//! Credentials, session tokens and role capabilities.
//!
//! Tokens are `base64url(claims json).base64url(hmac-sha256)`; passwords
//! are stored as bcrypt hashes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use hmac::{Hmac, Mac};
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::num::NonZeroU32;
use tracing::info;

use crate::config::SuperAdminConfig;
use crate::store::{LeagueStore, NewUser};
use crate::types::{Role, User};
use crate::utils::normalize_email;

type HmacSha256 = Hmac<Sha256>;

const BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed token")]
    MalformedToken,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Token expired")]
    Expired,
    #[error("Invalid signing key")]
    InvalidKey,
    #[error("Unsupported password hash format")]
    BadHashFormat,
    #[error("Password hashing failed")]
    Hashing,
    #[error("Token expiry out of range")]
    ExpiryOutOfRange,
}

/// What an authenticated caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageLeagues,
    ManageUsers,
    ManageLeague(i64),
    RecordResults(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id; visitors have none.
    pub sub: Option<i64>,
    pub role: Role,
    #[serde(rename = "ligaId")]
    pub league_id: Option<i64>,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn can(&self, capability: Capability) -> bool {
        match (self.role, capability) {
            (Role::SuperAdmin, _) => true,
            (
                Role::LeagueAdmin,
                Capability::ManageLeague(league_id) | Capability::RecordResults(league_id),
            ) => self.league_id == Some(league_id),
            (Role::Scorekeeper, Capability::RecordResults(league_id)) => {
                self.league_id == Some(league_id)
            }
            _ => false,
        }
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or(AuthError::ExpiryOutOfRange)
}

#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
    session_ttl: Duration,
    visitor_ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], session_ttl: Duration, visitor_ttl: Duration) -> Self {
        Self {
            key: secret.to_vec(),
            session_ttl,
            visitor_ttl,
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::InvalidKey)
    }

    pub fn issue_for(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.sign(&Claims {
            sub: Some(user.id),
            role: user.role,
            league_id: user.league_id,
            name: user.name.clone(),
            exp: expiry(now, self.session_ttl)?,
        })
    }

    pub fn issue_visitor(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        self.sign(&Claims {
            sub: None,
            role: Role::Visitor,
            league_id: None,
            name: "Visitante".to_string(),
            exp: expiry(now, self.visitor_ttl)?,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims).map_err(|_| AuthError::MalformedToken)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::MalformedToken)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|_| AuthError::Hashing)
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored).map_err(|_| AuthError::BadHashFormat)
}

pub type LoginLimiter<C = DefaultClock> =
    RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

fn login_quota(attempts_per_minute: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(attempts_per_minute).unwrap_or(nonzero!(10u32)))
}

pub fn login_limiter(attempts_per_minute: u32) -> LoginLimiter {
    RateLimiter::keyed(login_quota(attempts_per_minute))
}

pub fn login_limiter_with_clock<C: Clock>(attempts_per_minute: u32, clock: &C) -> LoginLimiter<C> {
    RateLimiter::dashmap_with_clock(login_quota(attempts_per_minute), clock)
}

/// Drops identifiers whose quota has fully replenished and returns how many
/// are still tracked.
pub fn prune_login_limiter<C: Clock>(limiter: &LoginLimiter<C>) -> usize {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    limiter.len()
}

/// Seeds the configured super-admin account when no active one exists.
pub async fn ensure_super_admin(
    store: &dyn LeagueStore,
    admin: &SuperAdminConfig,
) -> anyhow::Result<()> {
    if store.has_super_admin().await? {
        return Ok(());
    }
    let user = store
        .insert_user(NewUser {
            email: normalize_email(&admin.email),
            name: admin.name.clone(),
            password_hash: hash_password(&admin.password)?,
            role: Role::SuperAdmin,
            league_id: None,
        })
        .await?;
    info!("Seeded super-admin account '{}' ({})", user.name, user.email);
    Ok(())
}
