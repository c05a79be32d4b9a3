use chrono::Duration;
use serde::Serialize;

use crate::config::LegSettings;
use crate::entries::TeamEntry;
use crate::time::serialize_optional_time;

/// One team's result for one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegResult {
    pub leg_number: usize,
    pub runner: String,
    pub paired: bool,
    #[serde(serialize_with = "serialize_optional_time")]
    pub start_time: Option<Duration>,
    #[serde(serialize_with = "serialize_optional_time")]
    pub finish_time: Option<Duration>,
    pub in_mass_start: bool,
    /// Explicitly reported as not completed, even if a time exists
    pub dnf: bool,
    /// Index of the raw observation that recorded this finish
    pub finish_position: Option<usize>,
}

impl LegResult {
    pub fn new(leg_number: usize, runner: impl Into<String>, paired: bool) -> Self {
        Self {
            leg_number,
            runner: runner.into(),
            paired,
            start_time: None,
            finish_time: None,
            in_mass_start: false,
            dnf: false,
            finish_position: None,
        }
    }

    /// A leg completes when it has both times and is not flagged DNF.
    pub fn can_complete(&self) -> bool {
        !self.dnf && self.start_time.is_some() && self.finish_time.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) if !self.dnf => Some(finish - start),
            _ => None,
        }
    }
}

/// A team's reconstructed race: one [`LegResult`] per leg, in leg order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResult {
    pub entry: TeamEntry,
    pub legs: Vec<LegResult>,
    /// Overall position label ("1", "2=", "-"), set by ranking
    pub position_label: String,
}

impl TeamResult {
    pub fn new(entry: TeamEntry, settings: &LegSettings) -> Self {
        let legs = (1..=settings.number_of_legs())
            .map(|leg| {
                let runner = entry.runners.get(leg - 1).cloned().unwrap_or_default();
                LegResult::new(leg, runner, settings.is_paired(leg))
            })
            .collect();

        Self {
            entry,
            legs,
            position_label: String::new(),
        }
    }

    pub fn bib(&self) -> u32 {
        self.entry.bib
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn category(&self) -> &str {
        &self.entry.category
    }

    pub fn leg(&self, leg_number: usize) -> Option<&LegResult> {
        self.legs.get(leg_number.wrapping_sub(1))
    }

    pub fn can_complete(&self) -> bool {
        self.legs.iter().all(LegResult::can_complete)
    }

    /// Sum of leg durations; `None` unless every leg completes.
    pub fn duration(&self) -> Option<Duration> {
        self.legs
            .iter()
            .map(LegResult::duration)
            .try_fold(Duration::zero(), |total, d| d.map(|d| total + d))
    }

    /// Finish time of the last leg, if recorded.
    pub fn finish_time(&self) -> Option<Duration> {
        self.legs.last().and_then(|l| l.finish_time)
    }
}
