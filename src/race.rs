use anyhow::Result;
use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::{read_input, LegSettings, RaceConfig};
use crate::entries::{check_paired_legs, parse_entries};
use crate::error::RaceError;
use crate::notes::Notes;
use crate::prizes::{allocate_prizes, check_entry_categories, CategoryPrizes, CategoryTable};
use crate::ranking::{rank_legs, rank_teams, LegRanking};
use crate::raw::{apply_annotations, parse_annotations, parse_raw_results, repair};
use crate::time::serialize_optional_time;
use crate::timeline::{build_timeline, TeamResult};

/// Text of every input file a race is computed from.
#[derive(Debug, Clone, Default)]
pub struct RaceInputs {
    pub entries: String,
    pub raw_results: String,
    pub paper_results: Option<String>,
    pub annotations: Option<String>,
}

impl RaceInputs {
    /// Read the input files named in the config.
    pub fn load(config: &RaceConfig) -> Result<Self> {
        let paper_results = config
            .paper_results
            .as_deref()
            .map(|path| read_input(path, "paper results"))
            .transpose()?;
        let annotations = config
            .annotations
            .as_deref()
            .map(|path| read_input(path, "annotations"))
            .transpose()?;

        Ok(Self {
            entries: read_input(&config.entries, "entries")?,
            raw_results: read_input(&config.raw_results, "raw results")?,
            paper_results,
            annotations,
        })
    }
}

/// One team awarded a prize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeWinnerEntry {
    pub place: usize,
    pub bib: u32,
    pub team_name: String,
    pub entry_category: String,
    #[serde(serialize_with = "serialize_optional_time")]
    pub duration: Option<Duration>,
}

/// Winners of one prize category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeAward {
    pub category: String,
    pub exclusive: bool,
    pub winners: Vec<PrizeWinnerEntry>,
}

impl PrizeAward {
    fn from_allocation(prizes: CategoryPrizes, results: &[TeamResult]) -> Self {
        let winners = prizes
            .winners
            .iter()
            .filter_map(|winner| {
                let result = results.get(winner.result_index)?;
                Some(PrizeWinnerEntry {
                    place: winner.place,
                    bib: result.bib(),
                    team_name: result.name().to_string(),
                    entry_category: result.category().to_string(),
                    duration: result.duration(),
                })
            })
            .collect();

        Self {
            category: prizes.category,
            exclusive: prizes.exclusive,
            winners,
        }
    }
}

/// Everything computed for one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceOutcome {
    /// Team results in ranked order, position labels set
    pub results: Vec<TeamResult>,
    pub leg_rankings: Vec<LegRanking>,
    /// Prize categories from most to least general
    pub prizes: Vec<PrizeAward>,
    pub notes: Notes,
}

/// Run the full pipeline: parse, repair, build timelines, rank, award prizes.
///
/// The notes buffer lives for this one call and is returned in the outcome.
pub fn compute_results(
    inputs: &RaceInputs,
    settings: &LegSettings,
    categories: &CategoryTable,
) -> Result<RaceOutcome, RaceError> {
    let legs = settings.number_of_legs();
    let mut notes = Notes::new();

    let entries = parse_entries(&inputs.entries, legs)?;
    check_paired_legs(&entries, settings, &mut notes);
    check_entry_categories(&entries, categories, &mut notes);

    let mut observations = parse_raw_results(&inputs.raw_results, false)?;
    if let Some(paper) = &inputs.paper_results {
        observations.extend(parse_raw_results(paper, true)?);
    }
    if let Some(text) = &inputs.annotations {
        let annotations = parse_annotations(text)?;
        apply_annotations(&mut observations, &annotations)?;
    }
    let teams: BTreeSet<u32> = entries.iter().map(|e| e.bib).collect();
    repair(&mut observations, &teams, legs, &mut notes);

    let mut results = build_timeline(&entries, &observations, settings, &mut notes)?;
    rank_teams(&mut results);
    let leg_rankings = rank_legs(&results);
    let prizes = allocate_prizes(&results, categories)
        .into_iter()
        .map(|prizes| PrizeAward::from_allocation(prizes, &results))
        .collect();

    tracing::info!(
        teams = results.len(),
        observations = observations.len(),
        notes = notes.len(),
        "race results computed"
    );

    Ok(RaceOutcome {
        results,
        leg_rankings,
        prizes,
        notes,
    })
}
