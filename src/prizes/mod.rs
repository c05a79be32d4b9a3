pub mod allocator;
pub mod categories;

pub use allocator::{allocate_prizes, CategoryPrizes, PrizeCandidate, PrizeWinner};
pub use categories::{
    check_entry_categories, load_categories, CategoryTable, EntryCategory, Gender, PrizeCategory,
};
