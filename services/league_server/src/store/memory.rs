use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use super::{
    GoalDetail, LeagueChanges, LeagueStore, MatchChanges, MatchDetail, NewLeague, NewMatch,
    NewPlayer, NewSeason, NewTeam, NewUser, PlayerChanges, PlayerDetail, PlayerFilter,
    SeasonChanges, StoreError, StoreResult, TeamChanges, TeamSummary,
};
use crate::types::{
    Goal, League, Match, MatchStatus, NewGoal, Player, Role, Season, SeasonSnapshot, Team, User,
};
use crate::utils::normalize_email;

#[derive(Default)]
struct Tables {
    next_id: i64,
    leagues: BTreeMap<i64, League>,
    seasons: BTreeMap<i64, Season>,
    teams: BTreeMap<i64, Team>,
    players: BTreeMap<i64, Player>,
    matches: BTreeMap<i64, Match>,
    goals: BTreeMap<i64, Goal>,
    users: BTreeMap<i64, User>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn match_detail(&self, game: &Match) -> StoreResult<MatchDetail> {
        let team = |id: i64| {
            self.teams
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound("team"))
        };
        let goals = self
            .goals
            .values()
            .filter(|g| g.match_id == game.id)
            .filter_map(|g| {
                self.players.get(&g.player_id).map(|p| GoalDetail {
                    goal: g.clone(),
                    player: p.clone(),
                })
            })
            .collect();
        Ok(MatchDetail {
            game: game.clone(),
            home_team: team(game.home_team_id)?,
            away_team: team(game.away_team_id)?,
            goals,
        })
    }
}

/// In-process store backed by ordered maps behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeagueStore for MemoryStore {
    async fn list_leagues(&self) -> StoreResult<Vec<League>> {
        let tables = self.tables.read().await;
        let mut leagues: Vec<League> = tables.leagues.values().cloned().collect();
        leagues.sort_by(|a, b| b.active.cmp(&a.active).then_with(|| a.name.cmp(&b.name)));
        Ok(leagues)
    }

    async fn get_league(&self, id: i64) -> StoreResult<Option<League>> {
        Ok(self.tables.read().await.leagues.get(&id).cloned())
    }

    async fn insert_league(&self, new: NewLeague) -> StoreResult<League> {
        let mut tables = self.tables.write().await;
        if tables
            .leagues
            .values()
            .any(|l| l.name == new.name && l.kind == new.kind)
        {
            return Err(StoreError::Conflict(format!(
                "league {} ({}) already exists",
                new.name, new.kind
            )));
        }
        let league = League {
            id: tables.allocate_id(),
            name: new.name,
            kind: new.kind,
            city: new.city,
            active: true,
        };
        tables.leagues.insert(league.id, league.clone());
        Ok(league)
    }

    async fn update_league(&self, id: i64, changes: LeagueChanges) -> StoreResult<League> {
        let mut tables = self.tables.write().await;
        let league = tables
            .leagues
            .get_mut(&id)
            .ok_or(StoreError::NotFound("league"))?;
        if let Some(name) = changes.name {
            league.name = name;
        }
        if let Some(kind) = changes.kind {
            league.kind = kind;
        }
        if let Some(city) = changes.city {
            league.city = city;
        }
        if let Some(active) = changes.active {
            league.active = active;
        }
        Ok(league.clone())
    }

    async fn delete_league(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.leagues.contains_key(&id) {
            return Err(StoreError::NotFound("league"));
        }
        if tables.seasons.values().any(|s| s.league_id == id)
            || tables.users.values().any(|u| u.league_id == Some(id))
        {
            return Err(StoreError::HasDependents("league"));
        }
        tables.leagues.remove(&id);
        Ok(())
    }

    async fn list_seasons(&self, league_id: i64) -> StoreResult<Vec<Season>> {
        let tables = self.tables.read().await;
        let mut seasons: Vec<Season> = tables
            .seasons
            .values()
            .filter(|s| s.league_id == league_id)
            .cloned()
            .collect();
        seasons.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| b.year.cmp(&a.year))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(seasons)
    }

    async fn get_season(&self, id: i64) -> StoreResult<Option<Season>> {
        Ok(self.tables.read().await.seasons.get(&id).cloned())
    }

    async fn insert_season(&self, new: NewSeason) -> StoreResult<Season> {
        let mut tables = self.tables.write().await;
        if !tables.leagues.contains_key(&new.league_id) {
            return Err(StoreError::NotFound("league"));
        }
        if tables
            .seasons
            .values()
            .any(|s| s.league_id == new.league_id && s.name == new.name)
        {
            return Err(StoreError::Conflict(format!(
                "season {} already exists in the league",
                new.name
            )));
        }
        let season = Season {
            id: tables.allocate_id(),
            league_id: new.league_id,
            name: new.name,
            year: new.year,
            starts_on: new.starts_on,
            ends_on: new.ends_on,
            active: new.active,
        };
        tables.seasons.insert(season.id, season.clone());
        Ok(season)
    }

    async fn update_season(&self, id: i64, changes: SeasonChanges) -> StoreResult<Season> {
        let mut tables = self.tables.write().await;
        let season = tables
            .seasons
            .get_mut(&id)
            .ok_or(StoreError::NotFound("season"))?;
        if let Some(name) = changes.name {
            season.name = name;
        }
        if let Some(year) = changes.year {
            season.year = year;
        }
        if let Some(starts_on) = changes.starts_on {
            season.starts_on = starts_on;
        }
        if let Some(ends_on) = changes.ends_on {
            season.ends_on = ends_on;
        }
        if let Some(active) = changes.active {
            season.active = active;
        }
        Ok(season.clone())
    }

    async fn delete_season(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.seasons.contains_key(&id) {
            return Err(StoreError::NotFound("season"));
        }
        if tables.teams.values().any(|t| t.season_id == id)
            || tables.matches.values().any(|m| m.season_id == id)
        {
            return Err(StoreError::HasDependents("season"));
        }
        tables.seasons.remove(&id);
        Ok(())
    }

    async fn list_teams(&self, season_id: i64) -> StoreResult<Vec<TeamSummary>> {
        let tables = self.tables.read().await;
        let mut teams: Vec<TeamSummary> = tables
            .teams
            .values()
            .filter(|t| t.season_id == season_id)
            .map(|t| TeamSummary {
                team: t.clone(),
                active_players: tables
                    .players
                    .values()
                    .filter(|p| p.team_id == t.id && p.active)
                    .count() as i64,
            })
            .collect();
        teams.sort_by(|a, b| a.team.name.cmp(&b.team.name));
        Ok(teams)
    }

    async fn get_team(&self, id: i64) -> StoreResult<Option<Team>> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn insert_team(&self, new: NewTeam) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        if !tables.seasons.contains_key(&new.season_id) {
            return Err(StoreError::NotFound("season"));
        }
        if tables
            .teams
            .values()
            .any(|t| t.season_id == new.season_id && t.name == new.name)
        {
            return Err(StoreError::Conflict(format!(
                "team {} already exists in the season",
                new.name
            )));
        }
        let team = Team {
            id: tables.allocate_id(),
            season_id: new.season_id,
            name: new.name,
            crest_url: new.crest_url,
        };
        tables.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn update_team(&self, id: i64, changes: TeamChanges) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        let season_id = tables
            .teams
            .get(&id)
            .map(|t| t.season_id)
            .ok_or(StoreError::NotFound("team"))?;
        if let Some(name) = &changes.name {
            if tables
                .teams
                .values()
                .any(|t| t.id != id && t.season_id == season_id && &t.name == name)
            {
                return Err(StoreError::Conflict(format!(
                    "team {} already exists in the season",
                    name
                )));
            }
        }
        let team = tables
            .teams
            .get_mut(&id)
            .ok_or(StoreError::NotFound("team"))?;
        if let Some(name) = changes.name {
            team.name = name;
        }
        if let Some(crest_url) = changes.crest_url {
            team.crest_url = crest_url;
        }
        Ok(team.clone())
    }

    async fn delete_team(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&id) {
            return Err(StoreError::NotFound("team"));
        }
        if tables.players.values().any(|p| p.team_id == id)
            || tables.matches.values().any(|m| m.involves(id))
        {
            return Err(StoreError::HasDependents("team"));
        }
        tables.teams.remove(&id);
        Ok(())
    }

    async fn list_players(&self, filter: PlayerFilter) -> StoreResult<Vec<PlayerDetail>> {
        let tables = self.tables.read().await;
        let mut players: Vec<PlayerDetail> = tables
            .players
            .values()
            .filter(|p| p.active)
            .filter(|p| filter.team_id.map_or(true, |id| p.team_id == id))
            .filter_map(|p| {
                let team = tables.teams.get(&p.team_id)?;
                if filter.season_id.map_or(false, |id| team.season_id != id) {
                    return None;
                }
                Some(PlayerDetail {
                    player: p.clone(),
                    team: team.clone(),
                })
            })
            .collect();
        players.sort_by(|a, b| {
            a.team
                .name
                .cmp(&b.team.name)
                .then_with(|| a.player.name.cmp(&b.player.name))
        });
        Ok(players)
    }

    async fn get_player(&self, id: i64) -> StoreResult<Option<Player>> {
        Ok(self.tables.read().await.players.get(&id).cloned())
    }

    async fn find_players(&self, ids: &[i64]) -> StoreResult<Vec<Player>> {
        let tables = self.tables.read().await;
        let wanted: HashSet<i64> = ids.iter().copied().collect();
        Ok(tables
            .players
            .values()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_player(&self, new: NewPlayer) -> StoreResult<Player> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&new.team_id) {
            return Err(StoreError::NotFound("team"));
        }
        let player = Player {
            id: tables.allocate_id(),
            team_id: new.team_id,
            name: new.name,
            shirt_number: new.shirt_number,
            active: true,
        };
        tables.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn update_player(&self, id: i64, changes: PlayerChanges) -> StoreResult<Player> {
        let mut tables = self.tables.write().await;
        let player = tables
            .players
            .get_mut(&id)
            .ok_or(StoreError::NotFound("player"))?;
        if let Some(name) = changes.name {
            player.name = name;
        }
        if let Some(shirt_number) = changes.shirt_number {
            player.shirt_number = shirt_number;
        }
        if let Some(active) = changes.active {
            player.active = active;
        }
        Ok(player.clone())
    }

    async fn list_matches(
        &self,
        season_id: i64,
        round: Option<i32>,
    ) -> StoreResult<Vec<MatchDetail>> {
        let tables = self.tables.read().await;
        let mut matches: Vec<&Match> = tables
            .matches
            .values()
            .filter(|m| m.season_id == season_id)
            .filter(|m| round.map_or(true, |r| m.round == r))
            .collect();
        matches.sort_by(|a, b| a.round.cmp(&b.round).then_with(|| a.kickoff.cmp(&b.kickoff)));
        matches.into_iter().map(|m| tables.match_detail(m)).collect()
    }

    async fn get_match(&self, id: i64) -> StoreResult<Option<Match>> {
        Ok(self.tables.read().await.matches.get(&id).cloned())
    }

    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchDetail> {
        let mut tables = self.tables.write().await;
        let game = Match {
            id: tables.allocate_id(),
            season_id: new.season_id,
            home_team_id: new.home_team_id,
            away_team_id: new.away_team_id,
            round: new.round,
            kickoff: new.kickoff,
            pitch: new.pitch,
            home_goals: 0,
            away_goals: 0,
            status: MatchStatus::Scheduled,
        };
        let detail = tables.match_detail(&game)?;
        tables.matches.insert(game.id, game);
        Ok(detail)
    }

    async fn update_match(&self, id: i64, changes: MatchChanges) -> StoreResult<Match> {
        let mut tables = self.tables.write().await;
        let game = tables
            .matches
            .get_mut(&id)
            .ok_or(StoreError::NotFound("match"))?;
        if let Some(round) = changes.round {
            game.round = round;
        }
        if let Some(kickoff) = changes.kickoff {
            game.kickoff = kickoff;
        }
        if let Some(pitch) = changes.pitch {
            game.pitch = pitch;
        }
        Ok(game.clone())
    }

    async fn delete_match(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.matches.remove(&id).is_none() {
            return Err(StoreError::NotFound("match"));
        }
        tables.goals.retain(|_, g| g.match_id != id);
        Ok(())
    }

    async fn record_result(
        &self,
        match_id: i64,
        home_goals: i32,
        away_goals: i32,
        goals: Vec<NewGoal>,
    ) -> StoreResult<MatchDetail> {
        let mut tables = self.tables.write().await;
        if !tables.matches.contains_key(&match_id) {
            return Err(StoreError::NotFound("match"));
        }
        tables.goals.retain(|_, g| g.match_id != match_id);
        for new in goals {
            let goal = Goal {
                id: tables.allocate_id(),
                match_id,
                player_id: new.player_id,
                team_id: new.team_id,
                minute: new.minute,
            };
            tables.goals.insert(goal.id, goal);
        }
        let game = tables
            .matches
            .get_mut(&match_id)
            .ok_or(StoreError::NotFound("match"))?;
        game.home_goals = home_goals;
        game.away_goals = away_goals;
        game.status = MatchStatus::Played;
        let game = game.clone();
        tables.match_detail(&game)
    }

    async fn season_snapshot(&self, season_id: i64) -> StoreResult<SeasonSnapshot> {
        let tables = self.tables.read().await;
        let teams: Vec<Team> = tables
            .teams
            .values()
            .filter(|t| t.season_id == season_id)
            .cloned()
            .collect();
        let matches: Vec<Match> = tables
            .matches
            .values()
            .filter(|m| m.season_id == season_id && m.is_played())
            .cloned()
            .collect();
        let match_ids: HashSet<i64> = matches.iter().map(|m| m.id).collect();
        let goals: Vec<Goal> = tables
            .goals
            .values()
            .filter(|g| match_ids.contains(&g.match_id))
            .cloned()
            .collect();
        let scorer_ids: HashSet<i64> = goals.iter().map(|g| g.player_id).collect();
        let players: Vec<Player> = tables
            .players
            .values()
            .filter(|p| scorer_ids.contains(&p.id))
            .cloned()
            .collect();
        Ok(SeasonSnapshot {
            teams,
            matches,
            goals,
            players,
        })
    }

    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        let email = normalize_email(identifier);
        Ok(tables
            .users
            .values()
            .find(|u| u.name == identifier || u.email == email)
            .cloned())
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                new.email
            )));
        }
        let user = User {
            id: tables.allocate_id(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            role: new.role,
            league_id: new.league_id,
            active: true,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("user"))
    }

    async fn has_super_admin(&self) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.role == Role::SuperAdmin && u.active))
    }
}
