use chrono::Duration;
use serde::Serialize;
use std::cmp::Ordering;

use crate::time::serialize_optional_time;
use crate::timeline::TeamResult;

/// A result that can be ranked and awarded prizes.
pub trait RankedResult {
    fn can_complete(&self) -> bool;

    /// Ranking-relevant performance; lower is better. `None` when the
    /// result cannot complete.
    fn performance(&self) -> Option<Duration>;

    /// Name used as the final ordering tiebreak.
    fn sort_name(&self) -> &str;
}

impl RankedResult for TeamResult {
    fn can_complete(&self) -> bool {
        TeamResult::can_complete(self)
    }

    fn performance(&self) -> Option<Duration> {
        self.duration()
    }

    fn sort_name(&self) -> &str {
        self.name()
    }
}

/// Completing results first, then by performance, then by name.
pub fn compare_results<T: RankedResult>(a: &T, b: &T) -> Ordering {
    compare_performance(a, b).then_with(|| a.sort_name().cmp(b.sort_name()))
}

fn compare_performance<T: RankedResult>(a: &T, b: &T) -> Ordering {
    // Primary: able to complete before not
    b.can_complete()
        .cmp(&a.can_complete())
        // Then: faster first
        .then_with(|| match (a.performance(), b.performance()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Position labels for results already in ranked order.
///
/// A run of consecutive completing results that `dead_heat` groups together
/// all get `"<first position>="`; a lone result gets its plain position.
/// Results that cannot complete get `"-"` and never join a dead heat.
pub fn position_labels<T, F>(ranked: &[T], dead_heat: F) -> Vec<String>
where
    T: RankedResult,
    F: Fn(&T, &T) -> bool,
{
    let mut labels = Vec::with_capacity(ranked.len());
    let mut i = 0;

    while i < ranked.len() {
        if !ranked[i].can_complete() {
            labels.push("-".to_string());
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < ranked.len() && ranked[j].can_complete() && dead_heat(&ranked[j - 1], &ranked[j]) {
            j += 1;
        }

        let label = if j - i > 1 {
            format!("{}=", i + 1)
        } else {
            (i + 1).to_string()
        };
        labels.extend(std::iter::repeat(label).take(j - i));
        i = j;
    }

    labels
}

/// Sort team results and assign their position labels.
pub fn rank_teams(results: &mut [TeamResult]) {
    results.sort_by(compare_results);

    let labels = position_labels(results, |a, b| a.performance() == b.performance());
    for (result, label) in results.iter_mut().zip(labels) {
        result.position_label = label;
    }

    tracing::debug!(
        finishers = results.iter().filter(|r| r.can_complete()).count(),
        total = results.len(),
        "teams ranked"
    );
}

/// One team's entry in a single leg's ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegRankingEntry {
    /// Index into the ranked team results
    pub team_index: usize,
    pub bib: u32,
    pub team_name: String,
    pub runner: String,
    pub in_mass_start: bool,
    #[serde(serialize_with = "serialize_optional_time")]
    pub duration: Option<Duration>,
    pub finish_position: Option<usize>,
    pub position_label: String,
}

impl RankedResult for LegRankingEntry {
    fn can_complete(&self) -> bool {
        self.duration.is_some()
    }

    fn performance(&self) -> Option<Duration> {
        self.duration
    }

    fn sort_name(&self) -> &str {
        &self.team_name
    }
}

/// Ranking of every team for one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegRanking {
    pub leg_number: usize,
    pub entries: Vec<LegRankingEntry>,
}

/// Rank each leg independently.
///
/// Legs after the first allow dead heats on equal duration. Leg 1 finish
/// order was observed directly, so equal durations there are separated by
/// the order the finishes were recorded.
pub fn rank_legs(results: &[TeamResult]) -> Vec<LegRanking> {
    let legs = results.first().map(|r| r.legs.len()).unwrap_or(0);

    (1..=legs)
        .map(|leg_number| {
            let mut entries: Vec<LegRankingEntry> = results
                .iter()
                .enumerate()
                .filter_map(|(team_index, result)| {
                    let leg = result.leg(leg_number)?;
                    Some(LegRankingEntry {
                        team_index,
                        bib: result.bib(),
                        team_name: result.name().to_string(),
                        runner: leg.runner.clone(),
                        in_mass_start: leg.in_mass_start,
                        duration: leg.duration(),
                        finish_position: leg.finish_position,
                        position_label: String::new(),
                    })
                })
                .collect();

            let first_leg = leg_number == 1;
            if first_leg {
                entries.sort_by(|a, b| {
                    compare_performance(a, b)
                        .then_with(|| compare_finish_position(a.finish_position, b.finish_position))
                        .then_with(|| a.team_name.cmp(&b.team_name))
                });
            } else {
                entries.sort_by(compare_results);
            }

            let labels = position_labels(&entries, |a, b| {
                !first_leg && a.performance() == b.performance()
            });
            for (entry, label) in entries.iter_mut().zip(labels) {
                entry.position_label = label;
            }

            LegRanking {
                leg_number,
                entries,
            }
        })
        .collect()
}

fn compare_finish_position(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
