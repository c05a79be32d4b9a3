use chrono::Duration;
use std::collections::{BTreeSet, HashMap};

use super::types::RawObservation;
use crate::note;
use crate::notes::Notes;
use crate::time::{format_time, round_ratio_to_second};

const TIME_INTERPOLATED: &str = "Time not recorded. Time interpolated.";
const TIME_SET_TO_FIRST: &str =
    "Time not recorded. No basis for interpolation so set to first recorded time.";
const TIME_SET_TO_LAST: &str =
    "Time not recorded. No basis for interpolation so set to last recorded time.";
const TIME_SET_TO_ZERO: &str = "Time not recorded. No times recorded so set to zero.";
const BIB_NOT_GUESSED: &str =
    "Bib number not recorded. Not guessed as the recorded finishes are incomplete.";

/// Run every repair step over the observations, in order: fill missing
/// times, guess missing bib numbers, then note any finish-order
/// discrepancies.
///
/// `teams` holds the bib of every entered team. After this returns, every
/// observation has a finish time.
pub fn repair(
    observations: &mut [RawObservation],
    teams: &BTreeSet<u32>,
    legs: usize,
    notes: &mut Notes,
) {
    interpolate_missing_times(observations, notes);
    guess_missing_bib_numbers(observations, teams, legs, notes);
    note_out_of_order_times(observations, notes);
}

/// Fill every missing finish time.
///
/// A run of `n` missing times between known times `t0` and `t1` gets
/// `t0 + (t1 - t0) * i / (n + 1)` for the i-th slot, rounded half-up to the
/// whole second. A run before the first known time takes the first known
/// time; a run after the last known time repeats the last known time.
pub fn interpolate_missing_times(observations: &mut [RawObservation], notes: &mut Notes) {
    let known: Vec<usize> = observations
        .iter()
        .enumerate()
        .filter(|(_, o)| o.finish_time.is_some())
        .map(|(i, _)| i)
        .collect();

    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        for (i, observation) in observations.iter_mut().enumerate() {
            fill_time(observation, i, Duration::zero(), TIME_SET_TO_ZERO, notes);
        }
        return;
    };

    let first_time = observations[first].finish_time.unwrap_or_else(Duration::zero);
    for i in 0..first {
        fill_time(&mut observations[i], i, first_time, TIME_SET_TO_FIRST, notes);
    }

    for pair in known.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        let gap = after - before - 1;
        if gap == 0 {
            continue;
        }
        let t0 = observations[before].finish_time.unwrap_or_else(Duration::zero);
        let t1 = observations[after].finish_time.unwrap_or_else(Duration::zero);
        let (t0_ms, t1_ms) = (t0.num_milliseconds(), t1.num_milliseconds());
        let slots = gap as i64 + 1;

        for k in 1..=gap {
            let numerator = t0_ms * slots + (t1_ms - t0_ms) * k as i64;
            let time = round_ratio_to_second(numerator, slots);
            let index = before + k;
            fill_time(&mut observations[index], index, time, TIME_INTERPOLATED, notes);
        }
    }

    let last_time = observations[last].finish_time.unwrap_or_else(Duration::zero);
    for i in last + 1..observations.len() {
        fill_time(&mut observations[i], i, last_time, TIME_SET_TO_LAST, notes);
    }
}

fn fill_time(
    observation: &mut RawObservation,
    index: usize,
    time: Duration,
    explanation: &str,
    notes: &mut Notes,
) {
    observation.finish_time = Some(time);
    observation.append_comment(explanation);
    note!(
        notes,
        "Position {} ({}): {} Set to {}.",
        index + 1,
        observation.bib_label(),
        explanation,
        format_time(time)
    );
}

/// Guess missing bib numbers when a complete set of finishes was recorded.
///
/// Guessing is attempted only when the number of observations equals the
/// number of entered teams times the number of legs. Candidates are the
/// entered teams with fewer recorded finishes than legs, including teams
/// with no recorded bib at all. Each unknown bib goes to the candidate
/// team minimising, in order: finishes recorded
/// before this position, finishes recorded after it, its next known finish
/// time, its previous known finish time, and finally bib number.
pub fn guess_missing_bib_numbers(
    observations: &mut [RawObservation],
    teams: &BTreeSet<u32>,
    legs: usize,
    notes: &mut Notes,
) {
    let unknown: Vec<usize> = observations
        .iter()
        .enumerate()
        .filter(|(_, o)| o.bib.is_none())
        .map(|(i, _)| i)
        .collect();
    if unknown.is_empty() {
        return;
    }

    if observations.len() != teams.len() * legs {
        tracing::debug!(
            observations = observations.len(),
            teams = teams.len(),
            legs,
            "finish set incomplete, not guessing bib numbers"
        );
        for i in unknown {
            observations[i].append_comment(BIB_NOT_GUESSED);
            note!(notes, "Position {}: {}", i + 1, BIB_NOT_GUESSED);
        }
        return;
    }

    let mut counts: HashMap<u32, usize> = HashMap::new();
    for bib in observations.iter().filter_map(|o| o.bib) {
        *counts.entry(bib).or_default() += 1;
    }

    for i in unknown {
        let chosen = teams
            .iter()
            .copied()
            .filter(|bib| counts.get(bib).copied().unwrap_or(0) < legs)
            .min_by_key(|bib| candidate_key(observations, i, *bib));

        match chosen {
            Some(bib) => {
                observations[i].bib = Some(bib);
                *counts.entry(bib).or_default() += 1;
                let explanation = format!("Bib number not recorded. Guessed as {}.", bib);
                observations[i].append_comment(&explanation);
                note!(notes, "Position {}: {}", i + 1, explanation);
            }
            None => {
                observations[i].append_comment(BIB_NOT_GUESSED);
                note!(notes, "Position {}: {}", i + 1, BIB_NOT_GUESSED);
            }
        }
    }
}

/// Ordering key for assigning the observation at `index` to team `bib`.
///
/// A missing next finish sorts after any known time; a missing previous
/// finish sorts before any known time.
fn candidate_key(
    observations: &[RawObservation],
    index: usize,
    bib: u32,
) -> (usize, usize, (bool, Duration), Option<Duration>, u32) {
    let (before, after) = observations.split_at(index);
    let after = &after[1..];
    let is_team = |o: &&RawObservation| o.bib == Some(bib);

    let finishes_before = before.iter().filter(is_team).count();
    let finishes_after = after.iter().filter(is_team).count();
    let next_finish = after.iter().find(is_team).and_then(|o| o.finish_time);
    let previous_finish = before.iter().rev().find(is_team).and_then(|o| o.finish_time);

    let next_key = match next_finish {
        Some(t) => (false, t),
        None => (true, Duration::zero()),
    };

    (finishes_before, finishes_after, next_key, previous_finish, bib)
}

/// Note every recorded finish time earlier than the one before it.
pub fn note_out_of_order_times(observations: &[RawObservation], notes: &mut Notes) {
    for (i, pair) in observations.windows(2).enumerate() {
        if let (Some(previous), Some(current)) = (pair[0].finish_time, pair[1].finish_time) {
            if current < previous {
                note!(
                    notes,
                    "Position {} ({}): finish time {} is earlier than preceding finish time {}.",
                    i + 2,
                    pair[1].bib_label(),
                    format_time(current),
                    format_time(previous)
                );
            }
        }
    }
}
