use super::legs::{parse_dnf_leg, IndividualStart};
use super::schema::RaceConfig;
use crate::time::parse_config_time;
use std::collections::HashSet;

/// Validate race configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_race_config(config: &RaceConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.legs == 0 {
        errors.push("legs: must be at least 1".to_string());
    }

    if let Some(ref offset) = config.start_offset {
        if let Err(e) = parse_config_time(offset) {
            errors.push(format!("start_offset: {}", e));
        }
    }

    if let Some(ref slots) = config.mass_starts {
        if slots.len() != config.legs {
            errors.push(format!(
                "mass_starts: expected {} entries (one per leg), found {}",
                config.legs,
                slots.len()
            ));
        }
        if matches!(slots.first(), Some(Some(_))) {
            errors.push("mass_starts[0]: leg 1 cannot have a mass start".to_string());
        }

        let mut previous: Option<(usize, chrono::Duration)> = None;
        for (i, slot) in slots.iter().enumerate() {
            let Some(s) = slot else { continue };
            match parse_config_time(s) {
                Ok(t) => {
                    if let Some((previous_leg, previous_time)) = previous {
                        if t < previous_time {
                            errors.push(format!(
                                "mass_starts[{}]: leg {} mass start '{}' is earlier than leg {}",
                                i,
                                i + 1,
                                s,
                                previous_leg
                            ));
                        }
                    }
                    previous = Some((i + 1, t));
                }
                Err(e) => errors.push(format!("mass_starts[{}]: {}", i, e)),
            }
        }
    }

    if let Some(ref legs) = config.paired_legs {
        for (i, leg) in legs.iter().enumerate() {
            if *leg == 0 || *leg > config.legs {
                errors.push(format!(
                    "paired_legs[{}]: leg {} is out of range 1-{}",
                    i, leg, config.legs
                ));
            }
        }
    }

    if let Some(ref specs) = config.individual_starts {
        let mut seen = HashSet::new();
        for (i, spec) in specs.iter().enumerate() {
            match IndividualStart::parse(spec) {
                Ok(start) => {
                    if start.leg > config.legs {
                        errors.push(format!(
                            "individual_starts[{}]: leg {} is out of range 1-{}",
                            i, start.leg, config.legs
                        ));
                    }
                    if !seen.insert((start.bib, start.leg)) {
                        errors.push(format!(
                            "individual_starts[{}]: duplicate start for bib {} leg {}",
                            i, start.bib, start.leg
                        ));
                    }
                }
                Err(e) => errors.push(format!("individual_starts[{}]: {}", i, e)),
            }
        }
    }

    if let Some(ref specs) = config.dnf_legs {
        for (i, spec) in specs.iter().enumerate() {
            match parse_dnf_leg(spec) {
                Ok((_, leg)) if leg > config.legs => errors.push(format!(
                    "dnf_legs[{}]: leg {} is out of range 1-{}",
                    i, leg, config.legs
                )),
                Ok(_) => {}
                Err(e) => errors.push(format!("dnf_legs[{}]: {}", i, e)),
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
