//! Season tables computed from a consistent store snapshot.

use tracing::{debug, warn};

use crate::integrity::check_goal_tallies;
use crate::scorers::{ScorerRankingCalculator, ScorerRow};
use crate::standings::{StandingsCalculator, StandingsRow};
use crate::store::{LeagueStore, StoreResult};
use crate::types::SeasonSnapshot;

fn log_integrity(season_id: i64, snapshot: &SeasonSnapshot) {
    for warning in check_goal_tallies(&snapshot.matches, &snapshot.goals) {
        warn!("Season {}: {}", season_id, warning);
    }
}

/// League table of a season. An unknown season yields an empty table.
pub async fn season_standings(
    store: &dyn LeagueStore,
    season_id: i64,
) -> StoreResult<Vec<StandingsRow>> {
    let snapshot = store.season_snapshot(season_id).await?;
    log_integrity(season_id, &snapshot);
    let rows = StandingsCalculator::new().calculate(&snapshot.teams, &snapshot.matches);
    debug!("Computed standings of season {} ({} teams)", season_id, rows.len());
    Ok(rows)
}

pub async fn season_scorers(
    store: &dyn LeagueStore,
    season_id: i64,
) -> StoreResult<Vec<ScorerRow>> {
    let snapshot = store.season_snapshot(season_id).await?;
    log_integrity(season_id, &snapshot);
    let rows = ScorerRankingCalculator::new(season_id).calculate(
        &snapshot.goals,
        &snapshot.matches,
        &snapshot.players,
        &snapshot.teams,
    );
    debug!("Computed scorer ranking of season {} ({} players)", season_id, rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewLeague, NewMatch, NewPlayer, NewSeason, NewTeam};
    use crate::types::NewGoal;
    use chrono::{TimeZone, Utc};

    #[test_log::test(tokio::test)]
    async fn test_reports_from_store() {
        let store = MemoryStore::new();
        let league = store
            .insert_league(NewLeague {
                name: "Liga Femenil".to_string(),
                kind: "futbol7".to_string(),
                city: None,
            })
            .await
            .unwrap();
        let season = store
            .insert_season(NewSeason {
                league_id: league.id,
                name: "Apertura".to_string(),
                year: 2025,
                starts_on: None,
                ends_on: None,
                active: true,
            })
            .await
            .unwrap();
        let mut team_ids = Vec::new();
        for name in ["Halcones", "Águilas"] {
            let team = store
                .insert_team(NewTeam {
                    season_id: season.id,
                    name: name.to_string(),
                    crest_url: None,
                })
                .await
                .unwrap();
            team_ids.push(team.id);
        }
        let scorer = store
            .insert_player(NewPlayer {
                team_id: team_ids[0],
                name: "Renata".to_string(),
                shirt_number: Some(9),
            })
            .await
            .unwrap();
        let game = store
            .insert_match(NewMatch {
                season_id: season.id,
                home_team_id: team_ids[0],
                away_team_id: team_ids[1],
                round: 1,
                kickoff: Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap(),
                pitch: None,
            })
            .await
            .unwrap();

        let table = season_standings(&store, season.id).await.unwrap();
        assert_eq!(table[0].team_name, "Águilas");
        assert!(table.iter().all(|row| row.played == 0));

        store
            .record_result(
                game.game.id,
                1,
                0,
                vec![NewGoal {
                    player_id: scorer.id,
                    team_id: team_ids[0],
                    minute: Some(12),
                }],
            )
            .await
            .unwrap();

        let table = season_standings(&store, season.id).await.unwrap();
        assert_eq!(table[0].team_name, "Halcones");
        assert_eq!(table[0].points, 3);

        let scorers = season_scorers(&store, season.id).await.unwrap();
        assert_eq!(scorers.len(), 1);
        assert_eq!(scorers[0].player_name, "Renata");
        assert_eq!(scorers[0].goals, 1);

        assert!(season_standings(&store, 999).await.unwrap().is_empty());
    }
}
