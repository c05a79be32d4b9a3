use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::entries::TeamEntry;
use crate::note;
use crate::notes::Notes;

/// Gender class of a category. Declaration order is generality order:
/// Open is the most general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Gender {
    Open,
    Women,
    Mixed,
}

impl Gender {
    /// Whether an entry of gender `entry` may win a prize of this gender.
    pub fn accepts(self, entry: Gender) -> bool {
        self == Gender::Open || self == entry
    }
}

/// A category a team can enter under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntryCategory {
    pub code: String,
    pub gender: Gender,
    #[serde(default)]
    pub min_age: u32,
}

/// A category prizes are awarded in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrizeCategory {
    pub name: String,
    pub gender: Gender,
    #[serde(default)]
    pub min_age: u32,
    /// Number of prizes (1st, 2nd, ...)
    pub prizes: usize,
    /// A team may win at most one prize across all exclusive categories
    #[serde(default)]
    pub exclusive: bool,
}

/// Entry and prize categories plus eligibility rules.
///
/// Example YAML:
/// ```yaml
/// entry_categories:
///   - { code: "Open", gender: Open }
///   - { code: "Women 40+", gender: Women, min_age: 40 }
/// prize_categories:
///   - { name: "Open", gender: Open, prizes: 3, exclusive: true }
///   - { name: "Women 40+", gender: Women, min_age: 40, prizes: 1, exclusive: true }
/// eligibility:
///   "Open": ["Open", "Women 40+"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryTable {
    pub entry_categories: Vec<EntryCategory>,
    pub prize_categories: Vec<PrizeCategory>,
    /// Explicit overrides: prize category name -> eligible entry codes
    #[serde(default)]
    pub eligibility: BTreeMap<String, Vec<String>>,
}

impl CategoryTable {
    pub fn entry_category(&self, code: &str) -> Option<&EntryCategory> {
        self.entry_categories.iter().find(|c| c.code == code)
    }

    /// Whether a team entered under `entry_code` may win in `prize`.
    ///
    /// An explicit eligibility list for the prize category wins; otherwise
    /// the entry must be gender-compatible and at least as old as the
    /// prize category's minimum age. Unknown entry codes are never eligible.
    pub fn is_eligible(&self, entry_code: &str, prize: &PrizeCategory) -> bool {
        let Some(entry) = self.entry_category(entry_code) else {
            return false;
        };
        if let Some(codes) = self.eligibility.get(&prize.name) {
            return codes.iter().any(|c| c == entry_code);
        }
        prize.gender.accepts(entry.gender) && entry.min_age >= prize.min_age
    }

    /// Prize categories from most to least general: lowest minimum age
    /// first, then Open, Women, Mixed. Ties keep table order.
    pub fn prize_categories_by_generality(&self) -> Vec<&PrizeCategory> {
        let mut categories: Vec<&PrizeCategory> = self.prize_categories.iter().collect();
        categories.sort_by_key(|c| (c.min_age, c.gender));
        categories
    }

    /// Check the table is self-consistent. Returns all problems at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut codes = HashSet::new();
        for (i, category) in self.entry_categories.iter().enumerate() {
            if !codes.insert(category.code.as_str()) {
                errors.push(format!(
                    "entry_categories[{}]: duplicate code '{}'",
                    i, category.code
                ));
            }
        }

        let mut names = HashSet::new();
        for (i, category) in self.prize_categories.iter().enumerate() {
            if !names.insert(category.name.as_str()) {
                errors.push(format!(
                    "prize_categories[{}]: duplicate name '{}'",
                    i, category.name
                ));
            }
        }

        for (prize, entry_codes) in &self.eligibility {
            if !names.contains(prize.as_str()) {
                errors.push(format!("eligibility.{}: unknown prize category", prize));
            }
            for code in entry_codes {
                if !codes.contains(code.as_str()) {
                    errors.push(format!(
                        "eligibility.{}: unknown entry category '{}'",
                        prize, code
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load and validate a category table from a YAML file.
pub fn load_categories(path: &Path) -> Result<CategoryTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read categories file at {}", path.display()))?;

    let table: CategoryTable = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse categories: invalid YAML in {}", path.display()))?;

    if let Err(errors) = table.validate() {
        anyhow::bail!(
            "Invalid category table {}:\n  - {}",
            path.display(),
            errors.join("\n  - ")
        );
    }

    Ok(table)
}

/// Note entries whose category code is not in the table.
pub fn check_entry_categories(entries: &[TeamEntry], table: &CategoryTable, notes: &mut Notes) {
    for entry in entries {
        if table.entry_category(&entry.category).is_none() {
            note!(
                notes,
                "Team {} (bib {}): category '{}' is not a known entry category; not eligible for prizes.",
                entry.name,
                entry.bib,
                entry.category
            );
        }
    }
}
