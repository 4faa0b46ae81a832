use serde::Deserialize;
use std::collections::HashMap;

use crate::types::{Match, NewGoal, Player};

/// One goal of a result registration request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoalEntry {
    #[serde(rename = "jugadoraId")]
    pub player_id: i64,
    #[serde(rename = "minuto", default)]
    pub minute: Option<i32>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResultError {
    #[error("Player {0} not found")]
    UnknownPlayer(i64),
    #[error("Player {0} does not belong to either team of the match")]
    PlayerNotInMatch(String),
    #[error("Invalid goal minute {0}")]
    InvalidMinute(i32),
}

/// Score and goal records derived from a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalliedResult {
    pub home_goals: i32,
    pub away_goals: i32,
    pub goals: Vec<NewGoal>,
}

/// Credits each goal to the scorer's current team and counts the score.
/// `players` must contain every player referenced by `entries`.
pub fn tally_result(
    game: &Match,
    players: &[Player],
    entries: &[GoalEntry],
) -> Result<TalliedResult, ResultError> {
    let players: HashMap<i64, &Player> = players.iter().map(|p| (p.id, p)).collect();
    let mut tally = TalliedResult {
        home_goals: 0,
        away_goals: 0,
        goals: Vec::with_capacity(entries.len()),
    };

    for entry in entries {
        let player = players
            .get(&entry.player_id)
            .ok_or(ResultError::UnknownPlayer(entry.player_id))?;
        if player.team_id == game.home_team_id {
            tally.home_goals += 1;
        } else if player.team_id == game.away_team_id {
            tally.away_goals += 1;
        } else {
            return Err(ResultError::PlayerNotInMatch(player.name.clone()));
        }
        if let Some(minute) = entry.minute.filter(|m| *m < 0) {
            return Err(ResultError::InvalidMinute(minute));
        }
        tally.goals.push(NewGoal {
            player_id: player.id,
            team_id: player.team_id,
            minute: entry.minute,
        });
    }
    Ok(tally)
}
