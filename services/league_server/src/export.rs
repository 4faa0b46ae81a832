use std::io;
use std::path::Path;
use tracing::info;

use crate::report::{season_scorers, season_standings};
use crate::scorers::ScorerRow;
use crate::standings::StandingsRow;
use crate::store::{LeagueStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportKind {
    Standings,
    Scorers,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub fn write_standings<W: io::Write>(rows: &[StandingsRow], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["posicion", "equipo", "pj", "pg", "pe", "pp", "gf", "gc", "dg", "pts"])?;
    for row in rows {
        wtr.write_record(&[
            row.rank.to_string(),
            row.team_name.clone(),
            row.played.to_string(),
            row.won.to_string(),
            row.drawn.to_string(),
            row.lost.to_string(),
            row.goals_for.to_string(),
            row.goals_against.to_string(),
            row.goal_difference.to_string(),
            row.points.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_scorers<W: io::Write>(rows: &[ScorerRow], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["posicion", "jugadora", "equipo", "goles"])?;
    for row in rows {
        wtr.write_record(&[
            row.rank.to_string(),
            row.player_name.clone(),
            row.team_name.clone(),
            row.goals.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one season table to `out` and returns the number of data rows.
/// `out` is left untouched when the table cannot be loaded.
pub async fn export_season(
    store: &dyn LeagueStore,
    season_id: i64,
    kind: ExportKind,
    out: &Path,
) -> Result<usize, ExportError> {
    let rows = match kind {
        ExportKind::Standings => {
            let rows = season_standings(store, season_id).await?;
            write_standings(&rows, std::fs::File::create(out)?)?;
            rows.len()
        }
        ExportKind::Scorers => {
            let rows = season_scorers(store, season_id).await?;
            write_scorers(&rows, std::fs::File::create(out)?)?;
            rows.len()
        }
    };
    info!("Wrote {} {:?} rows of season {} to {:?}", rows, kind, season_id, out);
    Ok(rows)
}
