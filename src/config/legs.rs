use chrono::Duration;
use std::collections::{HashMap, HashSet};

use super::schema::RaceConfig;
use crate::error::RaceError;
use crate::time::parse_config_time;

/// A start time recorded for one runner rather than derived from the
/// previous leg or a mass start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndividualStart {
    pub bib: u32,
    pub leg: usize,
    pub time: Duration,
}

impl IndividualStart {
    /// Parse "bib/leg/time", e.g. "17/2/0:45:10".
    pub fn parse(spec: &str) -> Result<Self, RaceError> {
        let malformed = |reason: &str| RaceError::MalformedIndividualStart {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = spec.trim().splitn(3, '/').collect();
        if parts.len() != 3 {
            return Err(malformed("expected bib/leg/time"));
        }
        let bib = parts[0]
            .trim()
            .parse()
            .map_err(|_| malformed("invalid bib number"))?;
        let leg: usize = parts[1]
            .trim()
            .parse()
            .map_err(|_| malformed("invalid leg number"))?;
        if leg == 0 {
            return Err(malformed("leg numbers start at 1"));
        }
        let time = parse_config_time(parts[2]).map_err(|_| malformed("invalid time"))?;

        Ok(Self { bib, leg, time })
    }
}

/// Parse a DNF leg spec "bib/leg".
pub fn parse_dnf_leg(spec: &str) -> Result<(u32, usize), RaceError> {
    let malformed = |reason: &str| RaceError::MalformedDnfLeg {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let (bib, leg) = spec
        .trim()
        .split_once('/')
        .ok_or_else(|| malformed("expected bib/leg"))?;
    let bib = bib.trim().parse().map_err(|_| malformed("invalid bib number"))?;
    let leg: usize = leg.trim().parse().map_err(|_| malformed("invalid leg number"))?;
    if leg == 0 {
        return Err(malformed("leg numbers start at 1"));
    }
    Ok((bib, leg))
}

/// Per-leg race settings, resolved once at configuration time.
///
/// Leg numbers are 1-based throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct LegSettings {
    legs: usize,
    start_offset: Duration,
    configured_mass_starts: Vec<Option<Duration>>,
    effective_mass_starts: Vec<Option<Duration>>,
    paired: Vec<bool>,
    individual_starts: HashMap<(u32, usize), Duration>,
    dnf_legs: HashSet<(u32, usize)>,
}

impl LegSettings {
    /// Settings for a race with no mass starts, pairs or overrides.
    pub fn new(legs: usize) -> Result<Self, RaceError> {
        if legs == 0 {
            return Err(RaceError::NoLegs);
        }
        Ok(Self {
            legs,
            start_offset: Duration::zero(),
            configured_mass_starts: vec![None; legs],
            effective_mass_starts: vec![None; legs],
            paired: vec![false; legs],
            individual_starts: HashMap::new(),
            dnf_legs: HashSet::new(),
        })
    }

    pub fn from_config(config: &RaceConfig) -> Result<Self, RaceError> {
        let mut settings = Self::new(config.legs)?;

        if let Some(ref offset) = config.start_offset {
            settings.start_offset = parse_config_time(offset)?;
        }

        if let Some(ref slots) = config.mass_starts {
            if slots.len() != config.legs {
                return Err(RaceError::MalformedMassStart {
                    leg: slots.len(),
                    reason: format!("expected one entry per leg ({})", config.legs),
                });
            }
            let mut times = Vec::with_capacity(slots.len());
            for (i, slot) in slots.iter().enumerate() {
                let time = match slot {
                    Some(s) => Some(parse_config_time(s).map_err(|_| {
                        RaceError::MalformedMassStart {
                            leg: i + 1,
                            reason: format!("invalid time '{}'", s),
                        }
                    })?),
                    None => None,
                };
                times.push(time);
            }
            settings = settings.with_mass_starts(times)?;
        }

        for leg in config.paired_legs.iter().flatten() {
            settings = settings.with_paired_leg(*leg)?;
        }

        for spec in config.individual_starts.iter().flatten() {
            settings = settings.with_individual_start(IndividualStart::parse(spec)?)?;
        }

        for spec in config.dnf_legs.iter().flatten() {
            let (bib, leg) = parse_dnf_leg(spec)?;
            if leg > config.legs {
                return Err(RaceError::MalformedDnfLeg {
                    spec: spec.clone(),
                    reason: format!("race has {} legs", config.legs),
                });
            }
            settings.dnf_legs.insert((bib, leg));
        }

        Ok(settings)
    }

    pub fn with_start_offset(mut self, offset: Duration) -> Self {
        self.start_offset = offset;
        self
    }

    /// Set mass start times, one slot per leg.
    ///
    /// Leg 1 may not have a mass start, and configured times must not
    /// decrease with leg number. Legs without a mass start inherit the next
    /// later configured time for the purposes of [`LegSettings::mass_start`].
    pub fn with_mass_starts(mut self, times: Vec<Option<Duration>>) -> Result<Self, RaceError> {
        if times.len() != self.legs {
            return Err(RaceError::MalformedMassStart {
                leg: times.len(),
                reason: format!("expected one entry per leg ({})", self.legs),
            });
        }
        if times[0].is_some() {
            return Err(RaceError::MalformedMassStart {
                leg: 1,
                reason: "leg 1 always starts at the race start".to_string(),
            });
        }

        let mut previous: Option<(usize, Duration)> = None;
        for (i, time) in times.iter().enumerate() {
            if let Some(t) = time {
                if let Some((previous_leg, previous_time)) = previous {
                    if *t < previous_time {
                        return Err(RaceError::MassStartsOutOfOrder {
                            leg: i + 1,
                            previous_leg,
                        });
                    }
                }
                previous = Some((i + 1, *t));
            }
        }

        let mut effective = times.clone();
        for i in (1..self.legs.saturating_sub(1)).rev() {
            if effective[i].is_none() {
                effective[i] = effective[i + 1];
            }
        }

        self.configured_mass_starts = times;
        self.effective_mass_starts = effective;
        Ok(self)
    }

    pub fn with_paired_leg(mut self, leg: usize) -> Result<Self, RaceError> {
        if leg == 0 || leg > self.legs {
            return Err(RaceError::MalformedPairedLeg {
                leg,
                legs: self.legs,
            });
        }
        self.paired[leg - 1] = true;
        Ok(self)
    }

    pub fn with_individual_start(mut self, start: IndividualStart) -> Result<Self, RaceError> {
        if start.leg > self.legs {
            return Err(RaceError::MalformedIndividualStart {
                spec: format!("{}/{}", start.bib, start.leg),
                reason: format!("race has {} legs", self.legs),
            });
        }
        if self
            .individual_starts
            .insert((start.bib, start.leg), start.time)
            .is_some()
        {
            return Err(RaceError::MalformedIndividualStart {
                spec: format!("{}/{}", start.bib, start.leg),
                reason: "start recorded more than once".to_string(),
            });
        }
        Ok(self)
    }

    pub fn with_dnf_leg(mut self, bib: u32, leg: usize) -> Self {
        self.dnf_legs.insert((bib, leg));
        self
    }

    pub fn number_of_legs(&self) -> usize {
        self.legs
    }

    pub fn start_offset(&self) -> Duration {
        self.start_offset
    }

    /// Mass start time explicitly configured for `leg`.
    pub fn configured_mass_start(&self, leg: usize) -> Option<Duration> {
        self.configured_mass_starts.get(leg.wrapping_sub(1)).copied().flatten()
    }

    /// Mass start time in effect for `leg`, including one inherited from a
    /// later leg. `None` behaves as an infinitely late mass start.
    pub fn mass_start(&self, leg: usize) -> Option<Duration> {
        self.effective_mass_starts.get(leg.wrapping_sub(1)).copied().flatten()
    }

    pub fn is_mass_start_leg(&self, leg: usize) -> bool {
        self.configured_mass_start(leg).is_some()
    }

    pub fn is_paired(&self, leg: usize) -> bool {
        self.paired.get(leg.wrapping_sub(1)).copied().unwrap_or(false)
    }

    pub fn individual_start(&self, bib: u32, leg: usize) -> Option<Duration> {
        self.individual_starts.get(&(bib, leg)).copied()
    }

    pub fn is_dnf(&self, bib: u32, leg: usize) -> bool {
        self.dnf_legs.contains(&(bib, leg))
    }
}
