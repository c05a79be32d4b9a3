use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Race configuration as read from YAML.
///
/// Example:
/// ```yaml
/// name: "Example Relay"
/// legs: 4
/// entries: entries.txt
/// raw_results: rawtimes.txt
/// categories: categories.yaml
/// mass_starts: [null, null, "2:36:00", "3:36:00"]
/// paired_legs: [2, 4]
/// individual_starts: ["17/2/0:45:10"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RaceConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Number of legs in the relay
    pub legs: usize,

    /// Tab-separated entries table
    pub entries: PathBuf,

    /// Electronically recorded finishes, in finish order
    pub raw_results: PathBuf,

    /// Paper-recorded finishes, appended after `raw_results`
    #[serde(default)]
    pub paper_results: Option<PathBuf>,

    /// Line-numbered corrections applied before repair
    #[serde(default)]
    pub annotations: Option<PathBuf>,

    /// Entry and prize category table (YAML)
    pub categories: PathBuf,

    /// Offset added to the leg 1 start
    #[serde(default)]
    pub start_offset: Option<String>,

    /// One slot per leg; `null` for legs without a mass start
    #[serde(default)]
    pub mass_starts: Option<Vec<Option<String>>>,

    /// Legs run by a fixed pair of runners
    #[serde(default)]
    pub paired_legs: Option<Vec<usize>>,

    /// Individually recorded starts, "bib/leg/time"
    #[serde(default)]
    pub individual_starts: Option<Vec<String>>,

    /// Legs explicitly reported as not completed, "bib/leg"
    #[serde(default)]
    pub dnf_legs: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let yaml = r#"
legs: 2
entries: entries.txt
raw_results: raw.txt
categories: categories.yaml
"#;
        let config: RaceConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.legs, 2);
        assert_eq!(config.entries, PathBuf::from("entries.txt"));
        assert!(config.name.is_none());
        assert!(config.paper_results.is_none());
        assert!(config.mass_starts.is_none());
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
name: "Example Relay"
legs: 4
entries: entries.txt
raw_results: raw.txt
paper_results: paper.txt
annotations: annotations.txt
categories: categories.yaml
start_offset: "0:05:00"
mass_starts: [null, null, "2:36:00", "3:36:00"]
paired_legs: [2, 4]
individual_starts: ["17/2/0:45:10"]
dnf_legs: ["23/3"]
"#;
        let config: RaceConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("Example Relay"));
        let mass_starts = config.mass_starts.unwrap();
        assert_eq!(mass_starts.len(), 4);
        assert!(mass_starts[0].is_none());
        assert_eq!(mass_starts[2].as_deref(), Some("2:36:00"));
        assert_eq!(config.paired_legs, Some(vec![2, 4]));
        assert_eq!(config.dnf_legs.unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
legs: 2
entries: entries.txt
raw_results: raw.txt
categories: categories.yaml
colour: blue
"#;
        assert!(serde_saphyr::from_str::<RaceConfig>(yaml).is_err());
    }
}
