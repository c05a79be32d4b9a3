use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::notes::Notes;
use crate::race::PrizeAward;
use crate::ranking::LegRanking;
use crate::time::format_optional_time;
use crate::timeline::TeamResult;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width of the name column: the longest name, shrunk to what the terminal
/// leaves after the fixed columns. Pipes are never truncated.
fn name_column_width<'a>(names: impl Iterator<Item = &'a str>, fixed_width: usize) -> usize {
    let longest = names.map(|n| n.chars().count()).max().unwrap_or(0);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        // Very narrow terminal
        Some(_) => longest.min(20),
        None => longest,
    }
}

/// Format ranked team results as a table:
/// position, bib, team, category, total time.
pub fn format_results_table(results: &[TeamResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No results.".to_string();
    }

    let category_width = results
        .iter()
        .map(|r| r.category().chars().count())
        .max()
        .unwrap_or(0);
    // pos(4) + bib(5) + category + time(8) + separators
    let fixed_width = 4 + 1 + 5 + 2 + category_width + 2 + 8 + 2;
    let name_width = name_column_width(results.iter().map(|r| r.name()), fixed_width);

    results
        .iter()
        .map(|result| {
            let position = format!("{:>4}", result.position_label);
            let bib = format!("{:>5}", result.bib());
            let name = format!(
                "{:<width$}",
                truncate_name(result.name(), name_width),
                width = name_width
            );
            let category = format!("{:<width$}", result.category(), width = category_width);
            let time = format!("{:>8}", format_optional_time(result.duration()));

            let line = if use_colors {
                if result.can_complete() {
                    format!(
                        "{} {}  {}  {}  {}",
                        position.dimmed(),
                        bib,
                        name.bold(),
                        category.cyan(),
                        time.green()
                    )
                } else {
                    format!(
                        "{} {}  {}  {}  {}",
                        position.dimmed(),
                        bib,
                        name.dimmed(),
                        category.dimmed(),
                        time.dimmed()
                    )
                }
            } else {
                format!("{} {}  {}  {}  {}", position, bib, name, category, time)
            };
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format ranked team results as tab-separated values for scripting.
/// Columns: position, bib, team, category, total, then one duration per leg
/// (no headers, no colors)
pub fn format_results_tsv(results: &[TeamResult]) -> String {
    results
        .iter()
        .map(|result| {
            let mut fields = vec![
                result.position_label.clone(),
                result.bib().to_string(),
                result.name().to_string(),
                result.category().to_string(),
                format_optional_time(result.duration()),
            ];
            fields.extend(result.legs.iter().map(|leg| format_optional_time(leg.duration())));
            fields.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one leg's ranking. Runners who started in a mass start are
/// marked with `*`.
pub fn format_leg_ranking(ranking: &LegRanking, use_colors: bool) -> String {
    let heading = format!("Leg {}", ranking.leg_number);
    let mut lines = vec![if use_colors {
        heading.bold().underline().to_string()
    } else {
        heading
    }];

    if ranking.entries.is_empty() {
        lines.push("No results.".to_string());
        return lines.join("\n");
    }

    let runner_width = ranking
        .entries
        .iter()
        .map(|e| e.runner.chars().count())
        .max()
        .unwrap_or(0);
    let fixed_width = 4 + 1 + 5 + 2 + runner_width + 2 + 9 + 2;
    let name_width = name_column_width(
        ranking.entries.iter().map(|e| e.team_name.as_str()),
        fixed_width,
    );

    for entry in &ranking.entries {
        let position = format!("{:>4}", entry.position_label);
        let bib = format!("{:>5}", entry.bib);
        let name = format!(
            "{:<width$}",
            truncate_name(&entry.team_name, name_width),
            width = name_width
        );
        let runner = format!("{:<width$}", entry.runner, width = runner_width);
        let marker = if entry.in_mass_start { "*" } else { " " };
        let time = format!("{:>8}{}", format_optional_time(entry.duration), marker);

        let line = if use_colors {
            format!(
                "{} {}  {}  {}  {}",
                position.dimmed(),
                bib,
                name.bold(),
                runner,
                time.green()
            )
        } else {
            format!("{} {}  {}  {}  {}", position, bib, name, runner, time)
        };
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Format prize winners grouped by category, most general category first.
pub fn format_prizes(prizes: &[PrizeAward], use_colors: bool) -> String {
    if prizes.is_empty() {
        return "No prize categories.".to_string();
    }

    prizes
        .iter()
        .map(|award| {
            let heading = if use_colors {
                award.category.bold().underline().to_string()
            } else {
                award.category.clone()
            };

            let mut lines = vec![heading];
            if award.winners.is_empty() {
                lines.push("  (no eligible finishers)".to_string());
            }
            for winner in &award.winners {
                let time = format_optional_time(winner.duration);
                if use_colors {
                    lines.push(format!(
                        "  {}. {} (bib {}, {})  {}",
                        winner.place,
                        winner.team_name.bold(),
                        winner.bib,
                        winner.entry_category.cyan(),
                        time.green()
                    ));
                } else {
                    lines.push(format!(
                        "  {}. {} (bib {}, {})  {}",
                        winner.place, winner.team_name, winner.bib, winner.entry_category, time
                    ));
                }
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format the notes log, one note per line.
pub fn format_notes(notes: &Notes) -> String {
    if notes.is_empty() {
        return "No notes.".to_string();
    }
    notes.lines().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LegSettings;
    use crate::entries::TeamEntry;
    use crate::race::PrizeWinnerEntry;
    use crate::ranking::{rank_legs, rank_teams};
    use chrono::Duration;

    fn team(bib: u32, name: &str, legs: &[Option<i64>]) -> TeamResult {
        let entry = TeamEntry {
            bib,
            name: name.to_string(),
            category: "Open".to_string(),
            runners: (1..=legs.len()).map(|l| format!("Runner {}", l)).collect(),
        };
        let settings = LegSettings::new(legs.len()).unwrap();
        let mut result = TeamResult::new(entry, &settings);

        let mut clock = Some(Duration::zero());
        for (leg, minutes) in result.legs.iter_mut().zip(legs) {
            leg.start_time = clock;
            leg.finish_time = match (clock, minutes) {
                (Some(start), Some(m)) => Some(start + Duration::minutes(*m)),
                _ => None,
            };
            leg.finish_position = Some(bib as usize);
            clock = leg.finish_time;
        }
        result
    }

    fn ranked() -> Vec<TeamResult> {
        let mut results = vec![
            team(7, "Harriers", &[Some(20), Some(25)]),
            team(3, "Striders", &[Some(21), Some(19)]),
            team(9, "Pacers", &[Some(22), None]),
        ];
        rank_teams(&mut results);
        results
    }

    #[test]
    fn test_format_results_table_empty() {
        assert_eq!(format_results_table(&[], false), "No results.");
    }

    #[test]
    fn test_format_results_table() {
        let result = format_results_table(&ranked(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("   1"));
        assert!(lines[0].contains("Striders"));
        assert!(lines[0].ends_with("0:40:00"));
        assert!(lines[1].contains("Harriers"));
        assert!(lines[1].ends_with("0:45:00"));
        assert!(lines[2].starts_with("   -"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn test_format_results_tsv() {
        let result = format_results_tsv(&ranked());
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "1\t3\tStriders\tOpen\t0:40:00\t0:21:00\t0:19:00");
        assert_eq!(lines[2], "-\t9\tPacers\tOpen\t-\t0:22:00\t-");
    }

    #[test]
    fn test_format_results_tsv_empty() {
        assert_eq!(format_results_tsv(&[]), "");
    }

    #[test]
    fn test_format_leg_ranking() {
        let legs = rank_legs(&ranked());
        let result = format_leg_ranking(&legs[1], false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "Leg 2");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Striders"));
        assert!(lines[1].contains("0:19:00"));
        assert!(lines[3].contains("Pacers"));
    }

    #[test]
    fn test_format_leg_ranking_marks_mass_start() {
        let mut legs = rank_legs(&ranked());
        legs[1].entries[0].in_mass_start = true;
        let result = format_leg_ranking(&legs[1], false);
        assert!(result.lines().nth(1).unwrap().ends_with("0:19:00*"));
    }

    #[test]
    fn test_format_prizes() {
        let prizes = vec![
            PrizeAward {
                category: "Open".to_string(),
                exclusive: true,
                winners: vec![PrizeWinnerEntry {
                    place: 1,
                    bib: 3,
                    team_name: "Striders".to_string(),
                    entry_category: "Women".to_string(),
                    duration: Some(Duration::minutes(40)),
                }],
            },
            PrizeAward {
                category: "Mixed".to_string(),
                exclusive: true,
                winners: vec![],
            },
        ];
        let result = format_prizes(&prizes, false);
        assert_eq!(
            result,
            "Open\n  1. Striders (bib 3, Women)  0:40:00\n\nMixed\n  (no eligible finishers)"
        );
    }

    #[test]
    fn test_format_notes() {
        let mut notes = Notes::new();
        assert_eq!(format_notes(&notes), "No notes.");
        notes.add("Position 3: Time not recorded.");
        notes.add("Position 5: Bib number not recorded.");
        assert_eq!(
            format_notes(&notes),
            "Position 3: Time not recorded.\nPosition 5: Bib number not recorded."
        );
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Harriers", 20), "Harriers");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(truncate_name("Northern Harriers Relay Team", 15), "Northern Har...");
    }

    #[test]
    fn test_truncate_name_unicode() {
        assert_eq!(truncate_name("Coureurs d'Évian", 16), "Coureurs d'Évian");
        assert_eq!(truncate_name("Coureurs d'Évian", 13), "Coureurs d...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Harriers", 3), "Har");
    }
}
