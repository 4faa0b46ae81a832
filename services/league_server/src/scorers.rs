use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::{Goal, Match, Player, Team};
use crate::utils::compare_names;

/// One line of the top-scorer ranking ("goleo").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerRow {
    #[serde(rename = "jugadoraId")]
    pub player_id: i64,
    #[serde(rename = "jugadora")]
    pub player_name: String,
    #[serde(rename = "equipoId")]
    pub team_id: i64,
    #[serde(rename = "equipo")]
    pub team_name: String,
    #[serde(rename = "goles")]
    pub goals: u32,
    #[serde(rename = "posicion")]
    pub rank: usize,
}

/// Ranks the active players of a season by goals scored in played matches.
#[derive(Debug)]
pub struct ScorerRankingCalculator {
    season_id: i64,
}

impl ScorerRankingCalculator {
    pub fn new(season_id: i64) -> Self {
        Self { season_id }
    }

    /// Goals of players that cannot be resolved (unknown or inactive player,
    /// or a team missing from `teams`) are left out of the ranking.
    pub fn calculate(
        &self,
        goals: &[Goal],
        matches: &[Match],
        players: &[Player],
        teams: &[Team],
    ) -> Vec<ScorerRow> {
        let counted_matches: HashSet<i64> = matches
            .iter()
            .filter(|m| m.season_id == self.season_id && m.is_played())
            .map(|m| m.id)
            .collect();
        let players: HashMap<i64, &Player> = players
            .iter()
            .filter(|p| p.active)
            .map(|p| (p.id, p))
            .collect();
        let teams: HashMap<i64, &Team> = teams.iter().map(|t| (t.id, t)).collect();

        let mut tally: HashMap<i64, u32> = HashMap::new();
        for goal in goals
            .iter()
            .filter(|g| counted_matches.contains(&g.match_id) && players.contains_key(&g.player_id))
        {
            *tally.entry(goal.player_id).or_default() += 1;
        }

        let mut rows: Vec<ScorerRow> = tally
            .into_iter()
            .filter_map(|(player_id, count)| {
                let player = players.get(&player_id)?;
                let team = teams.get(&player.team_id)?;
                Some(ScorerRow {
                    player_id,
                    player_name: player.name.clone(),
                    team_id: team.id,
                    team_name: team.name.clone(),
                    goals: count,
                    rank: 0,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.goals
                .cmp(&a.goals)
                .then_with(|| compare_names(&a.player_name, &b.player_name))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        for (index, row) in rows.iter_mut().enumerate() {
            row.rank = index + 1;
        }
        rows
    }
}
