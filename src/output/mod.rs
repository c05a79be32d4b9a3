pub mod formatter;
pub mod report;

pub use formatter::{
    format_leg_ranking, format_notes, format_prizes, format_results_table, format_results_tsv,
    should_use_colors,
};
pub use report::{format_json, write_report};
