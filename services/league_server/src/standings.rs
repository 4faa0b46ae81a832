use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{Match, Team};
use crate::utils::compare_names;

/// One line of the league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    #[serde(rename = "equipoId")]
    pub team_id: i64,
    #[serde(rename = "equipo")]
    pub team_name: String,
    #[serde(rename = "pj")]
    pub played: u32,
    #[serde(rename = "pg")]
    pub won: u32,
    #[serde(rename = "pe")]
    pub drawn: u32,
    #[serde(rename = "pp")]
    pub lost: u32,
    #[serde(rename = "gf")]
    pub goals_for: i64,
    #[serde(rename = "gc")]
    pub goals_against: i64,
    #[serde(rename = "dg")]
    pub goal_difference: i64,
    #[serde(rename = "pts")]
    pub points: u32,
    #[serde(rename = "posicion")]
    pub rank: usize,
}

impl StandingsRow {
    fn empty(team: &Team) -> Self {
        Self {
            team_id: team.id,
            team_name: team.name.clone(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            rank: 0,
        }
    }

    fn record(&mut self, scored: i32, conceded: i32) {
        self.played += 1;
        self.goals_for += i64::from(scored);
        self.goals_against += i64::from(conceded);
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            }
            Ordering::Less => self.lost += 1,
            Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            }
        }
    }
}

/// Table order: points, goal difference and goals scored (all descending),
/// then team name, then id.
fn table_order(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| compare_names(&a.team_name, &b.team_name))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Builds the league table of a season from its teams and played matches.
#[derive(Debug, Default)]
pub struct StandingsCalculator;

impl StandingsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Every team gets a row, even without matches. Matches that are not
    /// played, or that reference a team outside `teams`, are ignored.
    pub fn calculate(&self, teams: &[Team], matches: &[Match]) -> Vec<StandingsRow> {
        let mut table: HashMap<i64, StandingsRow> = teams
            .iter()
            .map(|team| (team.id, StandingsRow::empty(team)))
            .collect();

        for m in matches.iter().filter(|m| m.is_played()) {
            if !table.contains_key(&m.home_team_id) || !table.contains_key(&m.away_team_id) {
                continue;
            }
            if let Some(home) = table.get_mut(&m.home_team_id) {
                home.record(m.home_goals, m.away_goals);
            }
            if let Some(away) = table.get_mut(&m.away_team_id) {
                away.record(m.away_goals, m.home_goals);
            }
        }

        let mut rows: Vec<StandingsRow> = table
            .into_values()
            .map(|mut row| {
                row.goal_difference = row.goals_for - row.goals_against;
                row
            })
            .collect();
        rows.sort_by(table_order);
        for (index, row) in rows.iter_mut().enumerate() {
            row.rank = index + 1;
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchStatus;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn team(id: i64, name: &str) -> Team {
        Team {
            id,
            season_id: 1,
            name: name.to_string(),
            crest_url: None,
        }
    }

    fn played(id: i64, home: i64, away: i64, home_goals: i32, away_goals: i32) -> Match {
        Match {
            id,
            season_id: 1,
            home_team_id: home,
            away_team_id: away,
            round: 1,
            kickoff: Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap(),
            pitch: None,
            home_goals,
            away_goals,
            status: MatchStatus::Played,
        }
    }

    fn four_teams() -> Vec<Team> {
        vec![team(4, "D"), team(2, "B"), team(3, "C"), team(1, "A")]
    }

    fn row<'a>(rows: &'a [StandingsRow], team_id: i64) -> &'a StandingsRow {
        rows.iter().find(|r| r.team_id == team_id).unwrap()
    }

    #[test]
    fn test_no_matches_sorted_by_name() {
        let rows = StandingsCalculator::new().calculate(&four_teams(), &[]);

        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        for (i, r) in rows.iter().enumerate() {
            assert_eq!(r.rank, i + 1);
            assert_eq!(
                (r.played, r.won, r.drawn, r.lost, r.points),
                (0, 0, 0, 0, 0)
            );
            assert_eq!((r.goals_for, r.goals_against, r.goal_difference), (0, 0, 0));
        }
    }

    #[test]
    fn test_home_win() {
        let rows = StandingsCalculator::new()
            .calculate(&[team(1, "A"), team(2, "B")], &[played(1, 1, 2, 3, 1)]);

        assert_eq!(
            rows[0],
            StandingsRow {
                team_id: 1,
                team_name: "A".to_string(),
                played: 1,
                won: 1,
                drawn: 0,
                lost: 0,
                goals_for: 3,
                goals_against: 1,
                goal_difference: 2,
                points: 3,
                rank: 1,
            }
        );
        assert_eq!(
            rows[1],
            StandingsRow {
                team_id: 2,
                team_name: "B".to_string(),
                played: 1,
                won: 0,
                drawn: 0,
                lost: 1,
                goals_for: 1,
                goals_against: 3,
                goal_difference: -2,
                points: 0,
                rank: 2,
            }
        );
    }

    #[test]
    fn test_away_win() {
        let rows = StandingsCalculator::new()
            .calculate(&[team(1, "A"), team(2, "B")], &[played(1, 1, 2, 0, 2)]);

        assert_eq!(rows[0].team_id, 2);
        assert_eq!((rows[0].won, rows[0].points), (1, 3));
        assert_eq!((rows[1].lost, rows[1].points), (1, 0));
    }

    #[test]
    fn test_draw() {
        let rows = StandingsCalculator::new()
            .calculate(&[team(1, "A"), team(2, "B")], &[played(1, 1, 2, 2, 2)]);

        for r in &rows {
            assert_eq!((r.played, r.drawn, r.points, r.goal_difference), (1, 1, 1, 0));
        }
        assert_eq!(rows[0].team_name, "A");
    }

    #[test]
    fn test_ignores_unknown_teams_and_scheduled_matches() {
        let mut scheduled = played(2, 1, 2, 5, 0);
        scheduled.status = MatchStatus::Scheduled;
        let matches = vec![played(1, 1, 99, 4, 0), scheduled];

        let rows = StandingsCalculator::new().calculate(&[team(1, "A"), team(2, "B")], &matches);

        assert!(rows.iter().all(|r| r.played == 0));
    }

    #[test]
    fn test_empty_teams() {
        let rows = StandingsCalculator::new().calculate(&[], &[played(1, 1, 2, 1, 0)]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_tie_breaks() {
        // All four finish on three points, so goal difference decides.
        let teams = four_teams();
        let matches = vec![
            played(1, 2, 1, 1, 0),
            played(2, 3, 4, 3, 0),
            played(3, 1, 4, 2, 2),
            played(4, 4, 1, 1, 1),
            played(5, 1, 4, 0, 0),
        ];

        let rows = StandingsCalculator::new().calculate(&teams, &matches);
        let order: Vec<i64> = rows.iter().map(|r| r.team_id).collect();

        assert_eq!(row(&rows, 3).points, 3);
        assert_eq!(row(&rows, 2).points, 3);
        assert_eq!(order[0], 3);
        assert_eq!(order[1], 2);
        assert_eq!(row(&rows, 1).points, row(&rows, 4).points);
        assert_eq!(row(&rows, 4).goal_difference, -3);
        assert_eq!(row(&rows, 1).goal_difference, -1);
        assert_eq!(order[2], 1);
        assert_eq!(order[3], 4);
    }

    #[test]
    fn test_goals_for_breaks_tie_before_name() {
        let teams = vec![team(1, "Alfa"), team(2, "Beta"), team(3, "Gamma"), team(4, "Delta")];
        let matches = vec![played(1, 1, 3, 1, 0), played(2, 2, 4, 3, 2)];

        let rows = StandingsCalculator::new().calculate(&teams, &matches);

        assert_eq!(rows[0].team_name, "Beta");
        assert_eq!(rows[1].team_name, "Alfa");
    }

    #[test]
    fn test_name_order_ignores_accents_and_case() {
        let teams = vec![team(1, "bravas"), team(2, "Águilas"), team(3, "Cóndores")];

        let rows = StandingsCalculator::new().calculate(&teams, &[]);
        let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();

        assert_eq!(names, vec!["Águilas", "bravas", "Cóndores"]);
    }

    fn season_fixture() -> (Vec<Team>, Vec<Match>) {
        let teams = vec![
            team(1, "Leonas"),
            team(2, "Pumas"),
            team(3, "Halcones"),
            team(4, "Tiburonas"),
            team(5, "Venadas"),
        ];
        let matches = vec![
            played(1, 1, 2, 2, 0),
            played(2, 3, 4, 1, 1),
            played(3, 5, 1, 0, 3),
            played(4, 2, 3, 2, 2),
            played(5, 4, 5, 4, 1),
            played(6, 1, 3, 0, 1),
            played(7, 2, 4, 0, 0),
            played(8, 5, 3, 2, 5),
        ];
        (teams, matches)
    }

    #[test]
    fn test_points_total_matches_results() {
        let (teams, matches) = season_fixture();
        let rows = StandingsCalculator::new().calculate(&teams, &matches);

        let decisive = matches.iter().filter(|m| m.home_goals != m.away_goals).count() as u32;
        let drawn = matches.len() as u32 - decisive;
        let total: u32 = rows.iter().map(|r| r.points).sum();

        assert_eq!(total, 3 * decisive + 2 * drawn);
        let goals_for: i64 = rows.iter().map(|r| r.goals_for).sum();
        let goals_against: i64 = rows.iter().map(|r| r.goals_against).sum();
        assert_eq!(goals_for, goals_against);
    }

    #[test]
    fn test_more_points_means_better_rank() {
        let (teams, matches) = season_fixture();
        let rows = StandingsCalculator::new().calculate(&teams, &matches);

        for a in &rows {
            for b in &rows {
                if a.points > b.points {
                    assert!(a.rank < b.rank, "{} should rank above {}", a.team_name, b.team_name);
                }
            }
        }
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let (teams, matches) = season_fixture();
        let calculator = StandingsCalculator::new();
        let first = calculator.calculate(&teams, &matches);
        let second = calculator.calculate(&teams, &matches);

        let mut reversed_teams = teams.clone();
        reversed_teams.reverse();
        let mut reversed_matches = matches.clone();
        reversed_matches.reverse();
        let third = calculator.calculate(&reversed_teams, &reversed_matches);

        assert_eq!(first, second);
        assert_eq!(first, third);
    }
}
