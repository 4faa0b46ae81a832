//! Persistence seam of the server.
//!
//! Handlers talk to a [`LeagueStore`]; production runs on [`PgStore`],
//! tests and local development on [`MemoryStore`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::types::{
    Goal, League, Match, NewGoal, Player, Role, Season, SeasonSnapshot, Team, User,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("{0} still has related data")]
    HasDependents(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewLeague {
    pub name: String,
    pub kind: String,
    pub city: Option<String>,
}

/// `None` leaves a field untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct LeagueChanges {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub city: Option<Option<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewSeason {
    pub league_id: i64,
    pub name: String,
    pub year: i32,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub starts_on: Option<Option<NaiveDate>>,
    pub ends_on: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub season_id: i64,
    pub name: String,
    pub crest_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamChanges {
    pub name: Option<String>,
    pub crest_url: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub team_id: i64,
    pub name: String,
    pub shirt_number: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerChanges {
    pub name: Option<String>,
    pub shirt_number: Option<Option<i32>>,
    pub active: Option<bool>,
}

/// Active players, optionally narrowed to a team and/or a season.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerFilter {
    pub team_id: Option<i64>,
    pub season_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub season_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub round: i32,
    pub kickoff: DateTime<Utc>,
    pub pitch: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchChanges {
    pub round: Option<i32>,
    pub kickoff: Option<DateTime<Utc>>,
    pub pitch: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub league_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    #[serde(flatten)]
    pub team: Team,
    #[serde(rename = "totalJugadoras")]
    pub active_players: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub player: Player,
    #[serde(rename = "equipo")]
    pub team: Team,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalDetail {
    #[serde(flatten)]
    pub goal: Goal,
    #[serde(rename = "jugadora")]
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub game: Match,
    #[serde(rename = "equipoLocal")]
    pub home_team: Team,
    #[serde(rename = "equipoVisita")]
    pub away_team: Team,
    #[serde(rename = "goles")]
    pub goals: Vec<GoalDetail>,
}

#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// Active leagues first, then by name.
    async fn list_leagues(&self) -> StoreResult<Vec<League>>;
    async fn get_league(&self, id: i64) -> StoreResult<Option<League>>;
    async fn insert_league(&self, new: NewLeague) -> StoreResult<League>;
    async fn update_league(&self, id: i64, changes: LeagueChanges) -> StoreResult<League>;
    async fn delete_league(&self, id: i64) -> StoreResult<()>;

    /// Active seasons first, then newest year, then name.
    async fn list_seasons(&self, league_id: i64) -> StoreResult<Vec<Season>>;
    async fn get_season(&self, id: i64) -> StoreResult<Option<Season>>;
    async fn insert_season(&self, new: NewSeason) -> StoreResult<Season>;
    async fn update_season(&self, id: i64, changes: SeasonChanges) -> StoreResult<Season>;
    async fn delete_season(&self, id: i64) -> StoreResult<()>;

    /// Teams of a season by name.
    async fn list_teams(&self, season_id: i64) -> StoreResult<Vec<TeamSummary>>;
    async fn get_team(&self, id: i64) -> StoreResult<Option<Team>>;
    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team>;
    async fn update_team(&self, id: i64, changes: TeamChanges) -> StoreResult<Team>;
    async fn delete_team(&self, id: i64) -> StoreResult<()>;

    /// Active players ordered by team name, then player name.
    async fn list_players(&self, filter: PlayerFilter) -> StoreResult<Vec<PlayerDetail>>;
    async fn get_player(&self, id: i64) -> StoreResult<Option<Player>>;
    /// Players with the given ids, active or not. Unknown ids are skipped.
    async fn find_players(&self, ids: &[i64]) -> StoreResult<Vec<Player>>;
    async fn insert_player(&self, new: NewPlayer) -> StoreResult<Player>;
    async fn update_player(&self, id: i64, changes: PlayerChanges) -> StoreResult<Player>;

    /// Matches of a season ordered by round, then kickoff.
    async fn list_matches(&self, season_id: i64, round: Option<i32>)
        -> StoreResult<Vec<MatchDetail>>;
    async fn get_match(&self, id: i64) -> StoreResult<Option<Match>>;
    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchDetail>;
    async fn update_match(&self, id: i64, changes: MatchChanges) -> StoreResult<Match>;
    /// Deletes a match together with its goals.
    async fn delete_match(&self, id: i64) -> StoreResult<()>;
    /// Replaces the goals of a match, stores the score and marks it played,
    /// all or nothing.
    async fn record_result(
        &self,
        match_id: i64,
        home_goals: i32,
        away_goals: i32,
        goals: Vec<NewGoal>,
    ) -> StoreResult<MatchDetail>;

    /// Consistent read of everything the stats calculators need.
    async fn season_snapshot(&self, season_id: i64) -> StoreResult<SeasonSnapshot>;

    /// Looks a user up by name or (case-insensitive) email.
    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn insert_user(&self, new: NewUser) -> StoreResult<User>;
    async fn delete_user(&self, id: i64) -> StoreResult<()>;
    async fn has_super_admin(&self) -> StoreResult<bool>;
}
