pub mod builder;
pub mod types;

pub use builder::build_timeline;
pub use types::{LegResult, TeamResult};
