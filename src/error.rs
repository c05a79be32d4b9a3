use thiserror::Error;

/// Fatal race data and configuration errors.
///
/// Any of these means the input cannot be reconciled with the race
/// configuration; the run is aborted and the data must be fixed upstream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaceError {
    #[error("invalid time '{0}'")]
    InvalidTime(String),

    #[error("entries line {line}: expected {expected} tab-separated fields, found {found}")]
    MalformedEntry {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("entries line {line}: invalid bib number '{value}'")]
    InvalidEntryBib { line: usize, value: String },

    #[error("duplicate bib number {0} in entries")]
    DuplicateBib(u32),

    #[error("raw results line {line}: {reason}")]
    MalformedRawResult { line: usize, reason: String },

    #[error("annotations line {line}: {reason}")]
    MalformedAnnotation { line: usize, reason: String },

    #[error("raw result at position {position}: bib number {bib} has no matching entry")]
    UnknownBib { position: usize, bib: u32 },

    #[error("bib number {bib}: more than {legs} finishes recorded")]
    TooManyFinishes { bib: u32, legs: usize },

    #[error("bib number {bib}: leg {leg} recorded more than once")]
    DuplicateExplicitLeg { bib: u32, leg: usize },

    #[error("bib number {bib}: leg number {leg} is out of range (race has {legs} legs)")]
    LegOutOfRange { bib: u32, leg: usize, legs: usize },

    #[error("race must have at least one leg")]
    NoLegs,

    #[error("invalid mass start for leg {leg}: {reason}")]
    MalformedMassStart { leg: usize, reason: String },

    #[error("mass start for leg {leg} is earlier than mass start for leg {previous_leg}")]
    MassStartsOutOfOrder { leg: usize, previous_leg: usize },

    #[error("invalid individual start '{spec}': {reason}")]
    MalformedIndividualStart { spec: String, reason: String },

    #[error("invalid DNF leg '{spec}': {reason}")]
    MalformedDnfLeg { spec: String, reason: String },

    #[error("invalid paired leg {leg} (race has {legs} legs)")]
    MalformedPairedLeg { leg: usize, legs: usize },
}
