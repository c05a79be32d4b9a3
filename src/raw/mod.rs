pub mod parse;
pub mod repair;
pub mod types;

pub use parse::{apply_annotations, parse_annotations, parse_raw_results, Annotation, FieldUpdate};
pub use repair::{
    guess_missing_bib_numbers, interpolate_missing_times, note_out_of_order_times, repair,
};
pub use types::RawObservation;
