use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{
    GoalDetail, LeagueChanges, LeagueStore, MatchChanges, MatchDetail, NewLeague, NewMatch,
    NewPlayer, NewSeason, NewTeam, NewUser, PlayerChanges, PlayerDetail, PlayerFilter,
    SeasonChanges, StoreError, StoreResult, TeamChanges, TeamSummary,
};
use crate::types::{
    Goal, League, Match, MatchStatus, NewGoal, Player, Season, SeasonSnapshot, Team, User,
};
use crate::utils::normalize_email;

const LEAGUE_COLUMNS: &str = "id, name, kind, city, active";
const SEASON_COLUMNS: &str = "id, league_id, name, year, starts_on, ends_on, active";
const TEAM_COLUMNS: &str = "id, season_id, name, crest_url";
const PLAYER_COLUMNS: &str = "id, team_id, name, shirt_number, active";
const MATCH_COLUMNS: &str =
    "id, season_id, home_team_id, away_team_id, round, kickoff, pitch, home_goals, away_goals, status";
const USER_COLUMNS: &str = "id, email, name, password_hash, role, league_id, active";

// Unique violations become conflicts, foreign key violations mean the row
// is still referenced.
fn write_error(err: sqlx::Error, entity: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", entity))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::HasDependents(entity)
        }
        _ => StoreError::Database(err),
    }
}

// On insert a foreign key violation means the parent row is missing.
fn insert_error(err: sqlx::Error, entity: &'static str, parent: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound(parent),
        _ => write_error(err, entity),
    }
}

#[derive(sqlx::FromRow)]
struct TeamSummaryRow {
    id: i64,
    season_id: i64,
    name: String,
    crest_url: Option<String>,
    active_players: i64,
}

#[derive(sqlx::FromRow)]
struct PlayerTeamRow {
    id: i64,
    team_id: i64,
    name: String,
    shirt_number: Option<i32>,
    active: bool,
    season_id: i64,
    team_name: String,
    crest_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct GoalPlayerRow {
    id: i64,
    match_id: i64,
    player_id: i64,
    team_id: i64,
    minute: Option<i32>,
    player_team_id: i64,
    player_name: String,
    shirt_number: Option<i32>,
    player_active: bool,
}

impl From<GoalPlayerRow> for GoalDetail {
    fn from(row: GoalPlayerRow) -> Self {
        GoalDetail {
            goal: Goal {
                id: row.id,
                match_id: row.match_id,
                player_id: row.player_id,
                team_id: row.team_id,
                minute: row.minute,
            },
            player: Player {
                id: row.player_id,
                team_id: row.player_team_id,
                name: row.player_name,
                shirt_number: row.shirt_number,
                active: row.player_active,
            },
        }
    }
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to Postgres with up to {} connections", max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    // Attaches teams and goals to a batch of matches.
    async fn details(&self, matches: Vec<Match>) -> StoreResult<Vec<MatchDetail>> {
        if matches.is_empty() {
            return Ok(Vec::new());
        }
        let match_ids: Vec<i64> = matches.iter().map(|m| m.id).collect();
        let team_ids: Vec<i64> = matches
            .iter()
            .flat_map(|m| [m.home_team_id, m.away_team_id])
            .collect();

        let teams: HashMap<i64, Team> = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM team WHERE id = ANY($1)",
            TEAM_COLUMNS
        ))
        .bind(&team_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

        let mut goals: HashMap<i64, Vec<GoalDetail>> = HashMap::new();
        let rows = sqlx::query_as::<_, GoalPlayerRow>(
            r#"
            SELECT g.id, g.match_id, g.player_id, g.team_id, g.minute,
                   p.team_id AS player_team_id, p.name AS player_name,
                   p.shirt_number, p.active AS player_active
            FROM match_goal g
            JOIN player p ON p.id = g.player_id
            WHERE g.match_id = ANY($1)
            ORDER BY g.id
            "#,
        )
        .bind(&match_ids)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            goals.entry(row.match_id).or_default().push(row.into());
        }

        matches
            .into_iter()
            .map(|game| {
                let home_team = teams
                    .get(&game.home_team_id)
                    .cloned()
                    .ok_or(StoreError::NotFound("team"))?;
                let away_team = teams
                    .get(&game.away_team_id)
                    .cloned()
                    .ok_or(StoreError::NotFound("team"))?;
                let goals = goals.remove(&game.id).unwrap_or_default();
                Ok(MatchDetail {
                    game,
                    home_team,
                    away_team,
                    goals,
                })
            })
            .collect()
    }

    async fn detail(&self, game: Match) -> StoreResult<MatchDetail> {
        self.details(vec![game])
            .await?
            .pop()
            .ok_or(StoreError::NotFound("match"))
    }
}

#[async_trait]
impl LeagueStore for PgStore {
    async fn list_leagues(&self) -> StoreResult<Vec<League>> {
        let leagues = sqlx::query_as::<_, League>(&format!(
            "SELECT {} FROM league ORDER BY active DESC, name ASC",
            LEAGUE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(leagues)
    }

    async fn get_league(&self, id: i64) -> StoreResult<Option<League>> {
        let league = sqlx::query_as::<_, League>(&format!(
            "SELECT {} FROM league WHERE id = $1",
            LEAGUE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(league)
    }

    async fn insert_league(&self, new: NewLeague) -> StoreResult<League> {
        sqlx::query_as::<_, League>(&format!(
            "INSERT INTO league (name, kind, city) VALUES ($1, $2, $3) RETURNING {}",
            LEAGUE_COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.kind)
        .bind(&new.city)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "league"))
    }

    async fn update_league(&self, id: i64, changes: LeagueChanges) -> StoreResult<League> {
        sqlx::query_as::<_, League>(&format!(
            r#"
            UPDATE league SET
                name = COALESCE($2, name),
                kind = COALESCE($3, kind),
                city = CASE WHEN $4 THEN $5 ELSE city END,
                active = COALESCE($6, active)
            WHERE id = $1
            RETURNING {}
            "#,
            LEAGUE_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.kind)
        .bind(changes.city.is_some())
        .bind(changes.city.flatten())
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "league"))?
        .ok_or(StoreError::NotFound("league"))
    }

    async fn delete_league(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM league WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "league"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("league"));
        }
        Ok(())
    }

    async fn list_seasons(&self, league_id: i64) -> StoreResult<Vec<Season>> {
        let seasons = sqlx::query_as::<_, Season>(&format!(
            "SELECT {} FROM season WHERE league_id = $1 ORDER BY active DESC, year DESC, name ASC",
            SEASON_COLUMNS
        ))
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seasons)
    }

    async fn get_season(&self, id: i64) -> StoreResult<Option<Season>> {
        let season = sqlx::query_as::<_, Season>(&format!(
            "SELECT {} FROM season WHERE id = $1",
            SEASON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(season)
    }

    async fn insert_season(&self, new: NewSeason) -> StoreResult<Season> {
        sqlx::query_as::<_, Season>(&format!(
            r#"
            INSERT INTO season (league_id, name, year, starts_on, ends_on, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SEASON_COLUMNS
        ))
        .bind(new.league_id)
        .bind(&new.name)
        .bind(new.year)
        .bind(new.starts_on)
        .bind(new.ends_on)
        .bind(new.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "season", "league"))
    }

    async fn update_season(&self, id: i64, changes: SeasonChanges) -> StoreResult<Season> {
        sqlx::query_as::<_, Season>(&format!(
            r#"
            UPDATE season SET
                name = COALESCE($2, name),
                year = COALESCE($3, year),
                starts_on = CASE WHEN $4 THEN $5 ELSE starts_on END,
                ends_on = CASE WHEN $6 THEN $7 ELSE ends_on END,
                active = COALESCE($8, active)
            WHERE id = $1
            RETURNING {}
            "#,
            SEASON_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.year)
        .bind(changes.starts_on.is_some())
        .bind(changes.starts_on.flatten())
        .bind(changes.ends_on.is_some())
        .bind(changes.ends_on.flatten())
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "season"))?
        .ok_or(StoreError::NotFound("season"))
    }

    async fn delete_season(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM season WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "season"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("season"));
        }
        Ok(())
    }

    async fn list_teams(&self, season_id: i64) -> StoreResult<Vec<TeamSummary>> {
        let rows = sqlx::query_as::<_, TeamSummaryRow>(
            r#"
            SELECT t.id, t.season_id, t.name, t.crest_url,
                   COUNT(p.id) FILTER (WHERE p.active) AS active_players
            FROM team t
            LEFT JOIN player p ON p.team_id = t.id
            WHERE t.season_id = $1
            GROUP BY t.id
            ORDER BY t.name ASC
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TeamSummary {
                team: Team {
                    id: row.id,
                    season_id: row.season_id,
                    name: row.name,
                    crest_url: row.crest_url,
                },
                active_players: row.active_players,
            })
            .collect())
    }

    async fn get_team(&self, id: i64) -> StoreResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM team WHERE id = $1",
            TEAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team> {
        sqlx::query_as::<_, Team>(&format!(
            "INSERT INTO team (season_id, name, crest_url) VALUES ($1, $2, $3) RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(new.season_id)
        .bind(&new.name)
        .bind(&new.crest_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "team", "season"))
    }

    async fn update_team(&self, id: i64, changes: TeamChanges) -> StoreResult<Team> {
        sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE team SET
                name = COALESCE($2, name),
                crest_url = CASE WHEN $3 THEN $4 ELSE crest_url END
            WHERE id = $1
            RETURNING {}
            "#,
            TEAM_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.crest_url.is_some())
        .bind(changes.crest_url.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "team"))?
        .ok_or(StoreError::NotFound("team"))
    }

    async fn delete_team(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM team WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "team"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("team"));
        }
        Ok(())
    }

    async fn list_players(&self, filter: PlayerFilter) -> StoreResult<Vec<PlayerDetail>> {
        let rows = sqlx::query_as::<_, PlayerTeamRow>(
            r#"
            SELECT p.id, p.team_id, p.name, p.shirt_number, p.active,
                   t.season_id, t.name AS team_name, t.crest_url
            FROM player p
            JOIN team t ON t.id = p.team_id
            WHERE p.active
              AND ($1::BIGINT IS NULL OR p.team_id = $1)
              AND ($2::BIGINT IS NULL OR t.season_id = $2)
            ORDER BY t.name ASC, p.name ASC
            "#,
        )
        .bind(filter.team_id)
        .bind(filter.season_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PlayerDetail {
                player: Player {
                    id: row.id,
                    team_id: row.team_id,
                    name: row.name,
                    shirt_number: row.shirt_number,
                    active: row.active,
                },
                team: Team {
                    id: row.team_id,
                    season_id: row.season_id,
                    name: row.team_name,
                    crest_url: row.crest_url,
                },
            })
            .collect())
    }

    async fn get_player(&self, id: i64) -> StoreResult<Option<Player>> {
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {} FROM player WHERE id = $1",
            PLAYER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    async fn find_players(&self, ids: &[i64]) -> StoreResult<Vec<Player>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let players = sqlx::query_as::<_, Player>(&format!(
            "SELECT {} FROM player WHERE id = ANY($1)",
            PLAYER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn insert_player(&self, new: NewPlayer) -> StoreResult<Player> {
        sqlx::query_as::<_, Player>(&format!(
            "INSERT INTO player (team_id, name, shirt_number) VALUES ($1, $2, $3) RETURNING {}",
            PLAYER_COLUMNS
        ))
        .bind(new.team_id)
        .bind(&new.name)
        .bind(new.shirt_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "player", "team"))
    }

    async fn update_player(&self, id: i64, changes: PlayerChanges) -> StoreResult<Player> {
        sqlx::query_as::<_, Player>(&format!(
            r#"
            UPDATE player SET
                name = COALESCE($2, name),
                shirt_number = CASE WHEN $3 THEN $4 ELSE shirt_number END,
                active = COALESCE($5, active)
            WHERE id = $1
            RETURNING {}
            "#,
            PLAYER_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.shirt_number.is_some())
        .bind(changes.shirt_number.flatten())
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("player"))
    }

    async fn list_matches(
        &self,
        season_id: i64,
        round: Option<i32>,
    ) -> StoreResult<Vec<MatchDetail>> {
        let matches = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {} FROM matches
            WHERE season_id = $1 AND ($2::INTEGER IS NULL OR round = $2)
            ORDER BY round ASC, kickoff ASC
            "#,
            MATCH_COLUMNS
        ))
        .bind(season_id)
        .bind(round)
        .fetch_all(&self.pool)
        .await?;
        debug!("Loaded {} matches of season {}", matches.len(), season_id);
        self.details(matches).await
    }

    async fn get_match(&self, id: i64) -> StoreResult<Option<Match>> {
        let game = sqlx::query_as::<_, Match>(&format!(
            "SELECT {} FROM matches WHERE id = $1",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(game)
    }

    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchDetail> {
        let game = sqlx::query_as::<_, Match>(&format!(
            r#"
            INSERT INTO matches (season_id, home_team_id, away_team_id, round, kickoff, pitch)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(new.season_id)
        .bind(new.home_team_id)
        .bind(new.away_team_id)
        .bind(new.round)
        .bind(new.kickoff)
        .bind(&new.pitch)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "match", "team"))?;
        self.detail(game).await
    }

    async fn update_match(&self, id: i64, changes: MatchChanges) -> StoreResult<Match> {
        sqlx::query_as::<_, Match>(&format!(
            r#"
            UPDATE matches SET
                round = COALESCE($2, round),
                kickoff = COALESCE($3, kickoff),
                pitch = CASE WHEN $4 THEN $5 ELSE pitch END
            WHERE id = $1
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(id)
        .bind(changes.round)
        .bind(changes.kickoff)
        .bind(changes.pitch.is_some())
        .bind(changes.pitch.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("match"))
    }

    async fn delete_match(&self, id: i64) -> StoreResult<()> {
        // Goals go with the match through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("match"));
        }
        Ok(())
    }

    async fn record_result(
        &self,
        match_id: i64,
        home_goals: i32,
        away_goals: i32,
        goals: Vec<NewGoal>,
    ) -> StoreResult<MatchDetail> {
        let mut tx = self.pool.begin().await?;

        // Lock the match row so concurrent registrations serialize.
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM matches WHERE id = $1 FOR UPDATE")
            .bind(match_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound("match"));
        }

        sqlx::query("DELETE FROM match_goal WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut *tx)
            .await?;

        for goal in &goals {
            sqlx::query(
                r#"
                INSERT INTO match_goal (match_id, player_id, team_id, minute)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(match_id)
            .bind(goal.player_id)
            .bind(goal.team_id)
            .bind(goal.minute)
            .execute(&mut *tx)
            .await?;
        }

        let game = sqlx::query_as::<_, Match>(&format!(
            r#"
            UPDATE matches SET home_goals = $2, away_goals = $3, status = $4
            WHERE id = $1
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .bind(home_goals)
        .bind(away_goals)
        .bind(MatchStatus::Played)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Recorded result {}-{} with {} goals for match {}",
            home_goals,
            away_goals,
            goals.len(),
            match_id
        );
        self.detail(game).await
    }

    async fn season_snapshot(&self, season_id: i64) -> StoreResult<SeasonSnapshot> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM team WHERE season_id = $1",
            TEAM_COLUMNS
        ))
        .bind(season_id)
        .fetch_all(&mut *tx)
        .await?;

        let matches = sqlx::query_as::<_, Match>(&format!(
            "SELECT {} FROM matches WHERE season_id = $1 AND status = $2",
            MATCH_COLUMNS
        ))
        .bind(season_id)
        .bind(MatchStatus::Played)
        .fetch_all(&mut *tx)
        .await?;

        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT g.id, g.match_id, g.player_id, g.team_id, g.minute
            FROM match_goal g
            JOIN matches m ON m.id = g.match_id
            WHERE m.season_id = $1 AND m.status = $2
            "#,
        )
        .bind(season_id)
        .bind(MatchStatus::Played)
        .fetch_all(&mut *tx)
        .await?;

        let players = sqlx::query_as::<_, Player>(
            r#"
            SELECT DISTINCT p.id, p.team_id, p.name, p.shirt_number, p.active
            FROM player p
            JOIN match_goal g ON g.player_id = p.id
            JOIN matches m ON m.id = g.match_id
            WHERE m.season_id = $1 AND m.status = $2
            "#,
        )
        .bind(season_id)
        .bind(MatchStatus::Played)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            "Season {} snapshot: {} teams, {} played matches, {} goals",
            season_id,
            teams.len(),
            matches.len(),
            goals.len()
        );
        Ok(SeasonSnapshot {
            teams,
            matches,
            goals,
            players,
        })
    }

    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user WHERE name = $1 OR email = $2 ORDER BY id LIMIT 1",
            USER_COLUMNS
        ))
        .bind(identifier)
        .bind(normalize_email(identifier))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user ORDER BY name ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO app_user (email, name, password_hash, role, league_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.league_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "user", "league"))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    async fn has_super_admin(&self) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM app_user WHERE role = 'SUPER_ADMIN' AND active)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
