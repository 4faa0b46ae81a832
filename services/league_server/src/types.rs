use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    #[serde(rename = "activa")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Season {
    pub id: i64,
    #[serde(rename = "ligaId")]
    pub league_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "fechaInicio")]
    pub starts_on: Option<NaiveDate>,
    #[serde(rename = "fechaFin")]
    pub ends_on: Option<NaiveDate>,
    #[serde(rename = "activa")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    #[serde(rename = "temporadaId")]
    pub season_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "escudoUrl")]
    pub crest_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: i64,
    #[serde(rename = "equipoId")]
    pub team_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "dorsal")]
    pub shirt_number: Option<i32>,
    #[serde(rename = "activa")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status_enum")]
pub enum MatchStatus {
    #[serde(rename = "PROGRAMADO")]
    #[sqlx(rename = "PROGRAMADO")]
    Scheduled,
    #[serde(rename = "JUGADO")]
    #[sqlx(rename = "JUGADO")]
    Played,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i64,
    #[serde(rename = "temporadaId")]
    pub season_id: i64,
    #[serde(rename = "equipoLocalId")]
    pub home_team_id: i64,
    #[serde(rename = "equipoVisitaId")]
    pub away_team_id: i64,
    #[serde(rename = "jornada")]
    pub round: i32,
    #[serde(rename = "fecha")]
    pub kickoff: DateTime<Utc>,
    #[serde(rename = "cancha")]
    pub pitch: Option<String>,
    #[serde(rename = "golesLocal")]
    pub home_goals: i32,
    #[serde(rename = "golesVisita")]
    pub away_goals: i32,
    pub status: MatchStatus,
}

impl Match {
    pub fn is_played(&self) -> bool {
        self.status == MatchStatus::Played
    }

    pub fn involves(&self, team_id: i64) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: i64,
    #[serde(rename = "partidoId")]
    pub match_id: i64,
    #[serde(rename = "jugadoraId")]
    pub player_id: i64,
    /// Team the player belonged to when the result was registered.
    #[serde(rename = "equipoId")]
    pub team_id: i64,
    #[serde(rename = "minuto")]
    pub minute: Option<i32>,
}

/// A goal scored in a match that is about to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub player_id: i64,
    pub team_id: i64,
    pub minute: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role_enum", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    LeagueAdmin,
    Scorekeeper,
    Visitor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "ligaId")]
    pub league_id: Option<i64>,
    #[serde(rename = "activo")]
    pub active: bool,
}

/// Everything the stats calculators need for one season, read in one go.
#[derive(Debug, Clone, Default)]
pub struct SeasonSnapshot {
    pub teams: Vec<Team>,
    /// Played matches only.
    pub matches: Vec<Match>,
    /// Goals of the played matches.
    pub goals: Vec<Goal>,
    /// Players referenced by `goals`, active or not.
    pub players: Vec<Player>,
}
