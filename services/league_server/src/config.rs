use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Allowed browser origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: (num_cpus::get() as u32 * 2).max(4),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub secret: String,
    pub session_ttl_hours: i64,
    pub visitor_ttl_hours: i64,
    pub login_attempts_per_minute: u32,
}

pub const DEFAULT_SESSION_SECRET: &str = "dev-only-session-secret";

/// Upper bound for token lifetimes (ten years).
pub const MAX_TTL_HOURS: i64 = 24 * 366 * 10;

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_hours: 12,
            visitor_ttl_hours: 24,
            login_attempts_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuperAdminConfig {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Default for SuperAdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@liga.local".to_string(),
            name: "superadmin".to_string(),
            password: "cambiar-esta-clave".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub super_admin: SuperAdminConfig,
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse::<T>().ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup` on top of the defaults. Unparseable
    /// numbers keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            config.database.url = Some(url);
        }
        if let Some(max) = parsed::<u32>(&lookup, "DATABASE_MAX_CONNECTIONS").filter(|m| *m > 0) {
            config.database.max_connections = max;
        }
        if let Some(secret) = lookup("SESSION_SECRET").filter(|s| !s.is_empty()) {
            config.session.secret = secret;
        }
        if let Some(hours) = parsed::<i64>(&lookup, "SESSION_TTL_HOURS").filter(|h| *h > 0) {
            config.session.session_ttl_hours = hours.min(MAX_TTL_HOURS);
        }
        if let Some(hours) = parsed::<i64>(&lookup, "VISITOR_TTL_HOURS").filter(|h| *h > 0) {
            config.session.visitor_ttl_hours = hours.min(MAX_TTL_HOURS);
        }
        if let Some(attempts) = parsed::<u32>(&lookup, "LOGIN_ATTEMPTS_PER_MINUTE").filter(|a| *a > 0) {
            config.session.login_attempts_per_minute = attempts;
        }
        if let Some(email) = lookup("SUPER_ADMIN_EMAIL") {
            config.super_admin.email = email;
        }
        if let Some(name) = lookup("SUPER_ADMIN_NAME") {
            config.super_admin.name = name;
        }
        if let Some(password) = lookup("SUPER_ADMIN_PASSWORD") {
            config.super_admin.password = password;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_overrides() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.bind_addr, "127.0.0.1:4000");
        assert_eq!(config.session.session_ttl_hours, 12);
        assert_eq!(config.session.visitor_ttl_hours, 24);
        assert!(config.database.max_connections >= 4);
    }

    #[test]
    fn test_overrides_applied() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("CORS_ORIGINS", "http://localhost:5173, https://liga.example ,"),
            ("DATABASE_URL", "postgres://liga@localhost/liga"),
            ("DATABASE_MAX_CONNECTIONS", "7"),
            ("SESSION_SECRET", "s3cret"),
            ("SESSION_TTL_HOURS", "2"),
            ("LOGIN_ATTEMPTS_PER_MINUTE", "3"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173".to_string(), "https://liga.example".to_string()]
        );
        assert_eq!(config.database.url.as_deref(), Some("postgres://liga@localhost/liga"));
        assert_eq!(config.database.max_connections, 7);
        assert_eq!(config.session.secret, "s3cret");
        assert_eq!(config.session.session_ttl_hours, 2);
        assert_eq!(config.session.visitor_ttl_hours, 24);
        assert_eq!(config.session.login_attempts_per_minute, 3);
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = AppConfig::from_lookup(|key| match key {
            "SESSION_TTL_HOURS" => Some("doce".to_string()),
            "LOGIN_ATTEMPTS_PER_MINUTE" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_ttl_hours_are_clamped() {
        let config = AppConfig::from_lookup(|key| match key {
            "SESSION_TTL_HOURS" => Some(i64::MAX.to_string()),
            "VISITOR_TTL_HOURS" => Some("9000000000000".to_string()),
            _ => None,
        });
        assert_eq!(config.session.session_ttl_hours, MAX_TTL_HOURS);
        assert_eq!(config.session.visitor_ttl_hours, MAX_TTL_HOURS);
    }
}
