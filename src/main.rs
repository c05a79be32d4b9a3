use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use relay_results::config::{load_config, validate_race_config, LegSettings};
use relay_results::output;
use relay_results::prizes::load_categories;
use relay_results::race::{compute_results, RaceInputs, RaceOutcome};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Overall team results (default if no subcommand)
    Results {
        /// Tab-separated output for scripting
        #[arg(long, conflicts_with = "json")]
        tsv: bool,
        /// Full results, leg rankings, prizes and notes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-leg rankings
    Legs {
        /// Show only this leg (1-based)
        leg: Option<usize>,
    },
    /// Prize winners by category
    Prizes,
    /// Repairs, warnings and discrepancies found while computing results
    Notes,
}

#[derive(Parser, Debug)]
#[command(name = "relay-results")]
#[command(about = "Relay race results from raw finish recordings", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to race config file (defaults to ./race.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Results {
        tsv: false,
        json: false,
    });
    let start_time = Instant::now();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate race config at startup
    if let Err(errors) = validate_race_config(&config) {
        eprintln!("Race config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let settings = match LegSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let categories = match load_categories(&config.categories) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let inputs = match RaceInputs::load(&config) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    let outcome = match compute_results(&inputs, &settings, &categories) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Race data error: {}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    if cli.verbose {
        eprintln!(
            "Computed {} teams over {} legs in {:?}",
            outcome.results.len(),
            settings.number_of_legs(),
            start_time.elapsed()
        );
    }

    let writing_file = cli.output.is_some();
    let use_colors = !writing_file && output::should_use_colors();

    let show_notes_hint = !matches!(command, Commands::Notes) && !outcome.notes.is_empty();
    let report = match render(&command, &outcome, config.name.as_deref(), use_colors) {
        Ok(r) => r,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(EXIT_CONFIG);
        }
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = output::write_report(&path, &report) {
                eprintln!("Output error: {:#}", e);
                std::process::exit(EXIT_DATA);
            }
            if cli.verbose {
                eprintln!("Report written to {}", path.display());
            }
        }
        None => println!("{}", report),
    }

    if show_notes_hint {
        eprintln!(
            "{} notes recorded; run `relay-results notes` to review them.",
            outcome.notes.len()
        );
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Render the report for one subcommand.
fn render(
    command: &Commands,
    outcome: &RaceOutcome,
    name: Option<&str>,
    use_colors: bool,
) -> Result<String, String> {
    match command {
        Commands::Results { tsv: true, .. } => Ok(output::format_results_tsv(&outcome.results)),
        Commands::Results { json: true, .. } => {
            output::format_json(outcome, name).map_err(|e| format!("Output error: {:#}", e))
        }
        Commands::Results { .. } => Ok(output::format_results_table(&outcome.results, use_colors)),
        Commands::Legs { leg: Some(leg) } => {
            let legs = outcome.leg_rankings.len();
            outcome
                .leg_rankings
                .get(leg.wrapping_sub(1))
                .map(|ranking| output::format_leg_ranking(ranking, use_colors))
                .ok_or_else(|| format!("Invalid leg {}. Must be between 1 and {}.", leg, legs))
        }
        Commands::Legs { leg: None } => Ok(outcome
            .leg_rankings
            .iter()
            .map(|ranking| output::format_leg_ranking(ranking, use_colors))
            .collect::<Vec<_>>()
            .join("\n\n")),
        Commands::Prizes => Ok(output::format_prizes(&outcome.prizes, use_colors)),
        Commands::Notes => Ok(output::format_notes(&outcome.notes)),
    }
}
