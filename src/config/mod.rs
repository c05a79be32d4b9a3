mod legs;
mod schema;
mod validation;

pub use legs::{IndividualStart, LegSettings};
pub use schema::RaceConfig;
pub use validation::validate_race_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "race.yaml";

/// Get the default config file path (./race.yaml)
pub fn get_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load race configuration from a YAML file
///
/// Relative input paths inside the file are resolved against the directory
/// containing the config file.
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<RaceConfig> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Create {} or pass --config",
            config_path.display(),
            DEFAULT_CONFIG_FILE
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: RaceConfig = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(resolve_paths(config, base_dir))
}

fn resolve_paths(mut config: RaceConfig, base_dir: &Path) -> RaceConfig {
    let resolve = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };

    config.entries = resolve(config.entries);
    config.raw_results = resolve(config.raw_results);
    config.categories = resolve(config.categories);
    config.paper_results = config.paper_results.map(resolve);
    config.annotations = config.annotations.map(resolve);
    config
}

/// Read an input file named by the config, with the file's role in the error.
pub fn read_input(path: &Path, role: &str) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file at {}", role, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_missing_config() {
        let path = env::temp_dir().join("relay_results_test_missing_config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = env::temp_dir().join("relay_results_test_config_dir");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("race.yaml");
        fs::write(
            &path,
            "legs: 2\nentries: entries.txt\nraw_results: /abs/raw.txt\ncategories: cats.yaml\n",
        )
        .unwrap();

        let config = load_config(Some(path.clone())).unwrap();
        assert_eq!(config.entries, dir.join("entries.txt"));
        assert_eq!(config.raw_results, PathBuf::from("/abs/raw.txt"));
        assert_eq!(config.categories, dir.join("cats.yaml"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = env::temp_dir().join("relay_results_test_config_bad");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("race.yaml");
        fs::write(&path, "legs: [oops\n").unwrap();

        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));

        let _ = fs::remove_file(&path);
    }
}
