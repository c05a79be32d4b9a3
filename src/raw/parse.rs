use chrono::Duration;

use super::types::RawObservation;
use crate::error::RaceError;
use crate::time::parse_time;

const UNKNOWN: &str = "?";
const PAPER_COMMENT: &str = "Paper-recorded.";

/// Parse a raw results stream.
///
/// Each line is `bib_or_? <tab> time_or_? [<tab> leg]`, optionally followed
/// by `# comment`. Line order is finish order. Blank lines and lines starting
/// with `#` are skipped.
pub fn parse_raw_results(text: &str, from_paper: bool) -> Result<Vec<RawObservation>, RaceError> {
    let mut observations = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        let (data, comment) = match line.split_once('#') {
            Some((d, c)) => (d, c.trim()),
            None => (line, ""),
        };
        if data.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| RaceError::MalformedRawResult {
            line: line_number,
            reason,
        };

        let fields: Vec<&str> = data.trim().split('\t').map(str::trim).collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(malformed(format!(
                "expected 2 or 3 tab-separated fields, found {}",
                fields.len()
            )));
        }

        let bib = parse_bib(fields[0]).map_err(malformed)?;
        let finish_time = parse_optional_time(fields[1]).map_err(malformed)?;

        let mut observation = RawObservation::new(bib, finish_time);
        if let Some(leg) = fields.get(2) {
            let leg: usize = leg
                .parse()
                .ok()
                .filter(|l| *l > 0)
                .ok_or_else(|| malformed(format!("invalid leg number '{}'", leg)))?;
            observation = observation.with_leg(leg);
        }
        if from_paper {
            observation.from_paper = true;
            observation.append_comment(PAPER_COMMENT);
        }
        observation.append_comment(comment);
        observations.push(observation);
    }

    tracing::debug!(count = observations.len(), from_paper, "raw results parsed");
    Ok(observations)
}

fn parse_bib(s: &str) -> Result<Option<u32>, String> {
    if s == UNKNOWN {
        return Ok(None);
    }
    s.parse()
        .map(Some)
        .map_err(|_| format!("invalid bib number '{}'", s))
}

fn parse_optional_time(s: &str) -> Result<Option<Duration>, String> {
    if s == UNKNOWN {
        return Ok(None);
    }
    parse_time(s).map(Some).map_err(|e| e.to_string())
}

/// How an annotation changes one field of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Empty field: leave as recorded
    Keep,
    /// `?`: mark as not recorded
    Clear,
    Set(T),
}

impl<T: Copy> FieldUpdate<T> {
    fn apply(&self, value: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => *value = None,
            FieldUpdate::Set(v) => *value = Some(*v),
        }
    }
}

/// A line-numbered correction to the raw results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Line in the annotations file
    pub line: usize,
    /// 1-based position in the combined raw results stream
    pub position: usize,
    pub bib: FieldUpdate<u32>,
    pub finish_time: FieldUpdate<Duration>,
    pub comment: String,
}

/// Parse annotation lines: `Update <tab> position <tab> bib <tab> time <tab> comment`.
pub fn parse_annotations(text: &str) -> Result<Vec<Annotation>, RaceError> {
    let mut annotations = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let malformed = |reason: String| RaceError::MalformedAnnotation {
            line: line_number,
            reason,
        };

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 4 || fields.len() > 5 {
            return Err(malformed(format!(
                "expected 4 or 5 tab-separated fields, found {}",
                fields.len()
            )));
        }
        if fields[0] != "Update" {
            return Err(malformed(format!("unknown annotation '{}'", fields[0])));
        }

        let position: usize = fields[1]
            .parse()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| malformed(format!("invalid position '{}'", fields[1])))?;

        let bib = match fields[2] {
            "" => FieldUpdate::Keep,
            UNKNOWN => FieldUpdate::Clear,
            s => FieldUpdate::Set(
                s.parse()
                    .map_err(|_| malformed(format!("invalid bib number '{}'", s)))?,
            ),
        };
        let finish_time = match fields[3] {
            "" => FieldUpdate::Keep,
            UNKNOWN => FieldUpdate::Clear,
            s => FieldUpdate::Set(parse_time(s).map_err(|e| malformed(e.to_string()))?),
        };

        annotations.push(Annotation {
            line: line_number,
            position,
            bib,
            finish_time,
            comment: fields.get(4).map(|s| s.to_string()).unwrap_or_default(),
        });
    }

    Ok(annotations)
}

/// Apply annotations in order. Runs before repair.
pub fn apply_annotations(
    observations: &mut [RawObservation],
    annotations: &[Annotation],
) -> Result<(), RaceError> {
    let recorded = observations.len();
    for annotation in annotations {
        let observation = annotation
            .position
            .checked_sub(1)
            .and_then(|index| observations.get_mut(index))
            .ok_or_else(|| RaceError::MalformedAnnotation {
                line: annotation.line,
                reason: format!(
                    "position {} is outside the {} recorded results",
                    annotation.position, recorded
                ),
            })?;

        annotation.bib.apply(&mut observation.bib);
        annotation.finish_time.apply(&mut observation.finish_time);
        observation.append_comment(&annotation.comment);
    }
    Ok(())
}
