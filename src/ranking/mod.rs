pub mod engine;

pub use engine::{
    compare_results, position_labels, rank_legs, rank_teams, LegRanking, LegRankingEntry,
    RankedResult,
};
