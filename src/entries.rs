use serde::Serialize;
use std::collections::HashSet;

use crate::config::LegSettings;
use crate::error::RaceError;
use crate::note;
use crate::notes::Notes;

/// One team as entered for the race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamEntry {
    pub bib: u32,
    pub name: String,
    pub category: String,
    /// One name per leg; paired legs hold a combined name ("A & B")
    pub runners: Vec<String>,
}

/// Parse the tab-separated entries table.
///
/// Each row is `bib, team, category, runner_1 .. runner_N`. Blank lines and
/// lines starting with `#` are skipped.
pub fn parse_entries(text: &str, legs: usize) -> Result<Vec<TeamEntry>, RaceError> {
    let expected = 3 + legs;
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() != expected {
            return Err(RaceError::MalformedEntry {
                line: line_number,
                expected,
                found: fields.len(),
            });
        }

        let bib: u32 = fields[0].parse().map_err(|_| RaceError::InvalidEntryBib {
            line: line_number,
            value: fields[0].to_string(),
        })?;
        if !seen.insert(bib) {
            return Err(RaceError::DuplicateBib(bib));
        }

        entries.push(TeamEntry {
            bib,
            name: fields[1].to_string(),
            category: fields[2].to_string(),
            runners: fields[3..].iter().map(|s| s.to_string()).collect(),
        });
    }

    tracing::debug!(count = entries.len(), "entries loaded");
    Ok(entries)
}

/// Note paired legs whose roster name does not name two runners.
pub fn check_paired_legs(entries: &[TeamEntry], settings: &LegSettings, notes: &mut Notes) {
    for entry in entries {
        for (i, runner) in entry.runners.iter().enumerate() {
            let leg = i + 1;
            if settings.is_paired(leg) && !runner.contains('&') {
                note!(
                    notes,
                    "Team {} (bib {}): leg {} is a paired leg but runner name '{}' names one runner.",
                    entry.name,
                    entry.bib,
                    leg,
                    runner
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let text = "# bib\tteam\tcategory\trunners\n\
                    1\tHarriers A\tOpen\tAnn\tBob\n\
                    \n\
                    2\tHarriers B\tWomen 40+\tCat\tDee & Eve\n";
        let entries = parse_entries(text, 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].bib, 1);
        assert_eq!(entries[0].name, "Harriers A");
        assert_eq!(entries[1].category, "Women 40+");
        assert_eq!(entries[1].runners, vec!["Cat", "Dee & Eve"]);
    }

    #[test]
    fn test_wrong_column_count() {
        let text = "1\tHarriers A\tOpen\tAnn\n";
        let err = parse_entries(text, 2).unwrap_err();
        assert_eq!(
            err,
            RaceError::MalformedEntry {
                line: 1,
                expected: 5,
                found: 4
            }
        );
    }

    #[test]
    fn test_invalid_bib() {
        let text = "A1\tHarriers A\tOpen\tAnn\n";
        let err = parse_entries(text, 1).unwrap_err();
        assert!(matches!(err, RaceError::InvalidEntryBib { line: 1, .. }));
    }

    #[test]
    fn test_duplicate_bib() {
        let text = "1\tHarriers A\tOpen\tAnn\n1\tHarriers B\tOpen\tBob\n";
        assert_eq!(parse_entries(text, 1).unwrap_err(), RaceError::DuplicateBib(1));
    }

    #[test]
    fn test_paired_leg_name_check() {
        let text = "1\tHarriers A\tOpen\tAnn\tBob\n2\tHarriers B\tOpen\tCat\tDee & Eve\n";
        let entries = parse_entries(text, 2).unwrap();
        let settings = LegSettings::new(2).unwrap().with_paired_leg(2).unwrap();
        let mut notes = Notes::new();

        check_paired_legs(&entries, &settings, &mut notes);
        assert_eq!(notes.len(), 1);
        assert!(notes.contains("bib 1"));
    }
}
