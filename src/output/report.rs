use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::Duration;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::notes::Notes;
use crate::race::{PrizeAward, RaceOutcome};
use crate::ranking::LegRanking;
use crate::time::serialize_optional_time;
use crate::timeline::{LegResult, TeamResult};

/// JSON view of a race: the outcome plus derived durations, which
/// the result types compute rather than store.
#[derive(Serialize)]
struct RaceReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    results: Vec<TeamReport<'a>>,
    leg_rankings: &'a [LegRanking],
    prizes: &'a [PrizeAward],
    notes: &'a Notes,
}

#[derive(Serialize)]
struct TeamReport<'a> {
    position: &'a str,
    bib: u32,
    team: &'a str,
    category: &'a str,
    #[serde(serialize_with = "serialize_optional_time")]
    duration: Option<Duration>,
    legs: Vec<LegReport<'a>>,
}

#[derive(Serialize)]
struct LegReport<'a> {
    #[serde(flatten)]
    leg: &'a LegResult,
    #[serde(serialize_with = "serialize_optional_time")]
    duration: Option<Duration>,
}

impl<'a> TeamReport<'a> {
    fn new(result: &'a TeamResult) -> Self {
        Self {
            position: &result.position_label,
            bib: result.bib(),
            team: result.name(),
            category: result.category(),
            duration: result.duration(),
            legs: result
                .legs
                .iter()
                .map(|leg| LegReport {
                    leg,
                    duration: leg.duration(),
                })
                .collect(),
        }
    }
}

/// Render the whole outcome as pretty-printed JSON for external renderers.
pub fn format_json(outcome: &RaceOutcome, name: Option<&str>) -> Result<String> {
    let report = RaceReport {
        name,
        results: outcome.results.iter().map(TeamReport::new).collect(),
        leg_rankings: &outcome.leg_rankings,
        prizes: &outcome.prizes,
        notes: &outcome.notes,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize race results")
}

/// Write a rendered report, replacing `path` atomically.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    file.commit()
        .with_context(|| format!("Failed to save report to {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = content.len(), "report written");
    Ok(())
}
