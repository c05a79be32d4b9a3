use chrono::Duration;
use std::collections::HashMap;

use super::types::TeamResult;
use crate::config::LegSettings;
use crate::entries::TeamEntry;
use crate::error::RaceError;
use crate::note;
use crate::notes::Notes;
use crate::raw::RawObservation;
use crate::time::format_time;

/// A finish recorded for a team, before it is placed in a leg slot.
#[derive(Debug, Clone, Copy)]
struct Finish {
    time: Option<Duration>,
    position: usize,
    explicit_leg: Option<usize>,
}

/// Build one [`TeamResult`] per entry from repaired observations.
///
/// Observations are walked in arrival order and each fills its team's next
/// unfilled leg. Finishes with an explicit leg number are placed in that
/// leg instead, with the remaining finishes filling the other legs in
/// arrival order. Start times and mass-start membership are then derived
/// leg by leg.
pub fn build_timeline(
    entries: &[TeamEntry],
    observations: &[RawObservation],
    settings: &LegSettings,
    notes: &mut Notes,
) -> Result<Vec<TeamResult>, RaceError> {
    let legs = settings.number_of_legs();
    let mut results: Vec<TeamResult> = entries
        .iter()
        .map(|entry| TeamResult::new(entry.clone(), settings))
        .collect();
    let index: HashMap<u32, usize> = results
        .iter()
        .enumerate()
        .map(|(i, r)| (r.bib(), i))
        .collect();

    let mut finishes: Vec<Vec<Finish>> = vec![Vec::new(); results.len()];
    for (position, observation) in observations.iter().enumerate() {
        let Some(bib) = observation.bib else {
            tracing::debug!(position = position + 1, "skipping observation with unknown bib");
            continue;
        };
        let team = *index.get(&bib).ok_or(RaceError::UnknownBib {
            position: position + 1,
            bib,
        })?;

        let team_finishes = &mut finishes[team];
        if team_finishes.len() == legs {
            return Err(RaceError::TooManyFinishes { bib, legs });
        }
        team_finishes.push(Finish {
            time: observation.finish_time,
            position,
            explicit_leg: observation.explicit_leg,
        });
    }

    for (result, team_finishes) in results.iter_mut().zip(&finishes) {
        let slots = assign_legs(result.bib(), team_finishes, legs)?;
        for (leg, finish) in result.legs.iter_mut().zip(slots) {
            if let Some(finish) = finish {
                leg.finish_time = finish.time;
                leg.finish_position = Some(finish.position);
            }
            leg.dnf = settings.is_dnf(result.entry.bib, leg.leg_number);
        }
        derive_start_times(result, settings, notes);
    }

    tracing::debug!(teams = results.len(), legs, "timeline built");
    Ok(results)
}

/// Place a team's finishes in leg slots.
fn assign_legs(bib: u32, finishes: &[Finish], legs: usize) -> Result<Vec<Option<Finish>>, RaceError> {
    let mut slots: Vec<Option<Finish>> = vec![None; legs];

    for finish in finishes {
        if let Some(leg) = finish.explicit_leg {
            if leg == 0 || leg > legs {
                return Err(RaceError::LegOutOfRange { bib, leg, legs });
            }
            if slots[leg - 1].is_some() {
                return Err(RaceError::DuplicateExplicitLeg { bib, leg });
            }
            slots[leg - 1] = Some(*finish);
        }
    }

    let mut unplaced = finishes.iter().filter(|f| f.explicit_leg.is_none());
    for slot in slots.iter_mut().filter(|s| s.is_none()) {
        match unplaced.next() {
            Some(finish) => *slot = Some(*finish),
            None => break,
        }
    }

    Ok(slots)
}

fn derive_start_times(result: &mut TeamResult, settings: &LegSettings, notes: &mut Notes) {
    let bib = result.entry.bib;
    let mut previous_finish: Option<Duration> = None;

    for i in 0..result.legs.len() {
        let leg_number = result.legs[i].leg_number;
        let (start, in_mass_start) = leg_start(settings, bib, leg_number, previous_finish);

        let leg = &mut result.legs[i];
        leg.start_time = start;
        leg.in_mass_start = in_mass_start;

        match (leg.start_time, leg.finish_time) {
            (Some(start), Some(finish)) if start > finish => {
                note!(
                    notes,
                    "Team {} (bib {}): leg {} start time {} is later than finish time {}. Start time discarded.",
                    result.entry.name,
                    bib,
                    leg_number,
                    format_time(start),
                    format_time(finish)
                );
                leg.start_time = None;
            }
            (None, Some(_)) => {
                note!(
                    notes,
                    "Team {} (bib {}): leg {} has no start time as leg {} has no finish time.",
                    result.entry.name,
                    bib,
                    leg_number,
                    leg_number - 1
                );
            }
            _ => {}
        }

        previous_finish = leg.finish_time;
    }
}

/// Start time and mass-start membership for one leg.
///
/// In priority order: an individually recorded start; the race start for
/// leg 1; unknown when the previous leg has no finish; otherwise the earlier
/// of the previous finish and the leg's mass start.
fn leg_start(
    settings: &LegSettings,
    bib: u32,
    leg: usize,
    previous_finish: Option<Duration>,
) -> (Option<Duration>, bool) {
    if let Some(start) = settings.individual_start(bib, leg) {
        return (Some(start), false);
    }
    if leg == 1 {
        return (Some(Duration::zero() + settings.start_offset()), false);
    }

    match previous_finish {
        None => (None, settings.is_mass_start_leg(leg)),
        Some(handover) => match settings.mass_start(leg) {
            Some(mass_start) if mass_start < handover => (Some(mass_start), true),
            _ => (Some(handover), false),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: i64, m: i64, s: i64) -> Duration {
        Duration::seconds(h * 3600 + m * 60 + s)
    }

    fn entry(bib: u32, name: &str, legs: usize) -> TeamEntry {
        TeamEntry {
            bib,
            name: name.to_string(),
            category: "Open".to_string(),
            runners: (1..=legs).map(|l| format!("Runner {}", l)).collect(),
        }
    }

    fn obs(bib: u32, time: Duration) -> RawObservation {
        RawObservation::new(Some(bib), Some(time))
    }

    #[test]
    fn test_sequential_legs() {
        let entries = vec![entry(1, "A", 2), entry(2, "B", 2)];
        let observations = vec![
            obs(2, hms(0, 20, 0)),
            obs(1, hms(0, 21, 0)),
            obs(2, hms(0, 41, 0)),
            obs(1, hms(0, 45, 0)),
        ];
        let settings = LegSettings::new(2).unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        let a = &results[0];
        assert_eq!(a.legs[0].start_time, Some(Duration::zero()));
        assert_eq!(a.legs[0].finish_time, Some(hms(0, 21, 0)));
        assert_eq!(a.legs[0].finish_position, Some(1));
        assert_eq!(a.legs[1].start_time, Some(hms(0, 21, 0)));
        assert_eq!(a.legs[1].finish_time, Some(hms(0, 45, 0)));
        assert_eq!(a.duration(), Some(hms(0, 45, 0)));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_start_offset_applies_to_first_leg() {
        let entries = vec![entry(1, "A", 1)];
        let observations = vec![obs(1, hms(0, 30, 0))];
        let settings = LegSettings::new(1).unwrap().with_start_offset(hms(0, 5, 0));
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        assert_eq!(results[0].legs[0].start_time, Some(hms(0, 5, 0)));
        assert_eq!(results[0].duration(), Some(hms(0, 25, 0)));
    }

    #[test]
    fn test_mass_start_earlier_than_handover() {
        let entries = vec![entry(1, "A", 3)];
        let observations = vec![
            obs(1, hms(1, 0, 0)),
            obs(1, hms(2, 5, 0)),
            obs(1, hms(2, 50, 0)),
        ];
        let settings = LegSettings::new(3)
            .unwrap()
            .with_mass_starts(vec![None, None, Some(hms(2, 0, 0))])
            .unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        let leg3 = &results[0].legs[2];
        assert_eq!(leg3.start_time, Some(hms(2, 0, 0)));
        assert!(leg3.in_mass_start);
        assert!(!results[0].legs[1].in_mass_start);
    }

    #[test]
    fn test_mass_start_later_than_handover_not_used() {
        let entries = vec![entry(1, "A", 2)];
        let observations = vec![obs(1, hms(1, 0, 0)), obs(1, hms(1, 50, 0))];
        let settings = LegSettings::new(2)
            .unwrap()
            .with_mass_starts(vec![None, Some(hms(1, 30, 0))])
            .unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        assert_eq!(results[0].legs[1].start_time, Some(hms(1, 0, 0)));
        assert!(!results[0].legs[1].in_mass_start);
    }

    #[test]
    fn test_inherited_mass_start_captures_early_leg() {
        // Leg 2 has no mass start of its own but inherits leg 3's. A leg 1
        // runner finishing after it puts the leg 2 runner in the mass start.
        let entries = vec![entry(1, "A", 3)];
        let observations = vec![
            obs(1, hms(2, 10, 0)),
            obs(1, hms(2, 40, 0)),
            obs(1, hms(3, 0, 0)),
        ];
        let settings = LegSettings::new(3)
            .unwrap()
            .with_mass_starts(vec![None, None, Some(hms(2, 0, 0))])
            .unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        let legs = &results[0].legs;
        assert_eq!(legs[1].start_time, Some(hms(2, 0, 0)));
        assert!(legs[1].in_mass_start);
        assert_eq!(legs[2].start_time, Some(hms(2, 0, 0)));
        assert!(legs[2].in_mass_start);
    }

    #[test]
    fn test_missing_previous_finish_leaves_start_unknown() {
        let entries = vec![entry(1, "A", 3)];
        // Only the leg 3 finish was recorded for a three-leg team
        let observations = vec![obs(1, hms(2, 30, 0)).with_leg(3)];
        let settings = LegSettings::new(3)
            .unwrap()
            .with_mass_starts(vec![None, None, Some(hms(2, 0, 0))])
            .unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        let legs = &results[0].legs;
        assert_eq!(legs[1].start_time, None);
        assert!(!legs[1].in_mass_start);
        assert_eq!(legs[2].finish_time, Some(hms(2, 30, 0)));
        assert_eq!(legs[2].start_time, None);
        assert!(legs[2].in_mass_start);
        assert!(!results[0].can_complete());
        assert_eq!(notes.len(), 1);
        assert!(notes.contains("leg 3 has no start time"));
    }

    #[test]
    fn test_individual_start_overrides() {
        let entries = vec![entry(1, "A", 2)];
        let observations = vec![obs(1, hms(0, 30, 0)), obs(1, hms(1, 0, 0))];
        let settings = LegSettings::new(2)
            .unwrap()
            .with_mass_starts(vec![None, Some(hms(0, 20, 0))])
            .unwrap()
            .with_individual_start(crate::config::IndividualStart {
                bib: 1,
                leg: 2,
                time: hms(0, 31, 0),
            })
            .unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        assert_eq!(results[0].legs[1].start_time, Some(hms(0, 31, 0)));
        assert!(!results[0].legs[1].in_mass_start);
    }

    #[test]
    fn test_explicit_leg_numbers_reorder() {
        let entries = vec![entry(1, "A", 3)];
        // Leg 3 runner finished before the leg 2 runner was recorded
        let observations = vec![
            obs(1, hms(0, 20, 0)),
            obs(1, hms(0, 50, 0)).with_leg(3),
            obs(1, hms(0, 55, 0)),
        ];
        let settings = LegSettings::new(3).unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        let legs = &results[0].legs;
        assert_eq!(legs[0].finish_time, Some(hms(0, 20, 0)));
        assert_eq!(legs[1].finish_time, Some(hms(0, 55, 0)));
        assert_eq!(legs[2].finish_time, Some(hms(0, 50, 0)));
        assert_eq!(legs[2].finish_position, Some(1));
        // Leg 3 starts at leg 2's finish, which is after its own finish
        assert_eq!(legs[2].start_time, None);
        assert!(notes.contains("later than finish time"));
    }

    #[test]
    fn test_unknown_bib_is_fatal() {
        let entries = vec![entry(1, "A", 1)];
        let observations = vec![obs(1, hms(0, 20, 0)), obs(9, hms(0, 21, 0))];
        let settings = LegSettings::new(1).unwrap();
        let mut notes = Notes::new();

        let err = build_timeline(&entries, &observations, &settings, &mut notes).unwrap_err();
        assert_eq!(err, RaceError::UnknownBib { position: 2, bib: 9 });
    }

    #[test]
    fn test_too_many_finishes_is_fatal() {
        let entries = vec![entry(1, "A", 1)];
        let observations = vec![obs(1, hms(0, 20, 0)), obs(1, hms(0, 21, 0))];
        let settings = LegSettings::new(1).unwrap();
        let mut notes = Notes::new();

        let err = build_timeline(&entries, &observations, &settings, &mut notes).unwrap_err();
        assert_eq!(err, RaceError::TooManyFinishes { bib: 1, legs: 1 });
    }

    #[test]
    fn test_duplicate_explicit_leg_is_fatal() {
        let entries = vec![entry(1, "A", 2)];
        let observations = vec![
            obs(1, hms(0, 20, 0)).with_leg(2),
            obs(1, hms(0, 21, 0)).with_leg(2),
        ];
        let settings = LegSettings::new(2).unwrap();
        let mut notes = Notes::new();

        let err = build_timeline(&entries, &observations, &settings, &mut notes).unwrap_err();
        assert_eq!(err, RaceError::DuplicateExplicitLeg { bib: 1, leg: 2 });
    }

    #[test]
    fn test_unknown_bib_observation_skipped() {
        let entries = vec![entry(1, "A", 1)];
        let observations = vec![
            RawObservation::new(None, Some(hms(0, 19, 0))),
            obs(1, hms(0, 20, 0)),
        ];
        let settings = LegSettings::new(1).unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        assert_eq!(results[0].legs[0].finish_time, Some(hms(0, 20, 0)));
        assert_eq!(results[0].legs[0].finish_position, Some(1));
    }

    #[test]
    fn test_configured_dnf_leg() {
        let entries = vec![entry(1, "A", 2)];
        let observations = vec![obs(1, hms(0, 20, 0)), obs(1, hms(0, 40, 0))];
        let settings = LegSettings::new(2).unwrap().with_dnf_leg(1, 2);
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &observations, &settings, &mut notes).unwrap();
        assert!(results[0].legs[1].dnf);
        assert_eq!(results[0].legs[1].finish_time, Some(hms(0, 40, 0)));
        assert!(!results[0].can_complete());
    }

    #[test]
    fn test_every_team_gets_every_leg() {
        let entries = vec![entry(1, "A", 3), entry(2, "B", 3)];
        let settings = LegSettings::new(3).unwrap();
        let mut notes = Notes::new();

        let results = build_timeline(&entries, &[], &settings, &mut notes).unwrap();
        assert!(results.iter().all(|r| r.legs.len() == 3));
        assert!(results.iter().all(|r| !r.can_complete()));
    }
}
