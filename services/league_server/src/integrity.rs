use std::collections::HashMap;
use std::fmt;

use crate::types::{Goal, Match};

/// Disagreement between a played match's stored score and its goal records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataIntegrityWarning {
    ScoreMismatch {
        match_id: i64,
        stored: (i32, i32),
        from_goals: (i32, i32),
    },
    ForeignTeamGoal {
        match_id: i64,
        goal_id: i64,
        team_id: i64,
    },
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScoreMismatch {
                match_id,
                stored,
                from_goals,
            } => write!(
                f,
                "match {} stores {}-{} but its goals add up to {}-{}",
                match_id, stored.0, stored.1, from_goals.0, from_goals.1
            ),
            Self::ForeignTeamGoal {
                match_id,
                goal_id,
                team_id,
            } => write!(
                f,
                "goal {} of match {} credits team {}, which did not play it",
                goal_id, match_id, team_id
            ),
        }
    }
}

/// Cross-checks played matches against their goal records. Scheduled
/// matches are skipped; a played match with no goal records must be 0-0.
pub fn check_goal_tallies(matches: &[Match], goals: &[Goal]) -> Vec<DataIntegrityWarning> {
    let mut by_match: HashMap<i64, Vec<&Goal>> = HashMap::new();
    for goal in goals {
        by_match.entry(goal.match_id).or_default().push(goal);
    }

    let mut warnings = Vec::new();
    for m in matches.iter().filter(|m| m.is_played()) {
        let mut tally = (0, 0);
        for goal in by_match.get(&m.id).map(Vec::as_slice).unwrap_or_default() {
            if goal.team_id == m.home_team_id {
                tally.0 += 1;
            } else if goal.team_id == m.away_team_id {
                tally.1 += 1;
            } else {
                warnings.push(DataIntegrityWarning::ForeignTeamGoal {
                    match_id: m.id,
                    goal_id: goal.id,
                    team_id: goal.team_id,
                });
            }
        }
        if tally != (m.home_goals, m.away_goals) {
            warnings.push(DataIntegrityWarning::ScoreMismatch {
                match_id: m.id,
                stored: (m.home_goals, m.away_goals),
                from_goals: tally,
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchStatus;
    use chrono::Utc;

    fn game(id: i64, home_goals: i32, away_goals: i32, status: MatchStatus) -> Match {
        Match {
            id,
            season_id: 1,
            home_team_id: 10,
            away_team_id: 20,
            round: 1,
            kickoff: Utc::now(),
            pitch: None,
            home_goals,
            away_goals,
            status,
        }
    }

    fn goal(id: i64, match_id: i64, team_id: i64) -> Goal {
        Goal {
            id,
            match_id,
            player_id: id,
            team_id,
            minute: Some(10),
        }
    }

    #[test]
    fn test_consistent_matches_have_no_warnings() {
        let matches = vec![
            game(1, 2, 1, MatchStatus::Played),
            game(2, 0, 0, MatchStatus::Played),
            game(3, 0, 0, MatchStatus::Scheduled),
        ];
        let goals = vec![goal(1, 1, 10), goal(2, 1, 10), goal(3, 1, 20)];

        assert!(check_goal_tallies(&matches, &goals).is_empty());
    }

    #[test]
    fn test_score_mismatch_reported() {
        let matches = vec![game(1, 3, 0, MatchStatus::Played)];
        let goals = vec![goal(1, 1, 10)];

        let warnings = check_goal_tallies(&matches, &goals);

        assert_eq!(
            warnings,
            vec![DataIntegrityWarning::ScoreMismatch {
                match_id: 1,
                stored: (3, 0),
                from_goals: (1, 0),
            }]
        );
        assert_eq!(
            warnings[0].to_string(),
            "match 1 stores 3-0 but its goals add up to 1-0"
        );
    }

    #[test]
    fn test_foreign_team_goal_reported() {
        let matches = vec![game(1, 1, 0, MatchStatus::Played)];
        let goals = vec![goal(1, 1, 10), goal(2, 1, 30)];

        let warnings = check_goal_tallies(&matches, &goals);

        assert_eq!(
            warnings,
            vec![DataIntegrityWarning::ForeignTeamGoal {
                match_id: 1,
                goal_id: 2,
                team_id: 30,
            }]
        );
    }
}
