//! Relay race results from error-prone field recordings.
//!
//! Raw finish observations are repaired, turned into per-leg team
//! timelines, ranked with dead heats, and used to allocate category prizes.
//! [`race::compute_results`] runs the whole pipeline.

pub mod config;
pub mod entries;
pub mod error;
pub mod notes;
pub mod output;
pub mod prizes;
pub mod race;
pub mod ranking;
pub mod raw;
pub mod time;
pub mod timeline;

pub use error::RaceError;
pub use notes::Notes;
