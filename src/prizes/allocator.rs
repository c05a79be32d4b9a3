use serde::Serialize;
use std::collections::HashSet;

use crate::ranking::RankedResult;
use crate::timeline::TeamResult;

use super::categories::{CategoryTable, PrizeCategory};

/// A ranked result that entered under a category code.
pub trait PrizeCandidate: RankedResult {
    fn entry_category(&self) -> &str;
}

impl PrizeCandidate for TeamResult {
    fn entry_category(&self) -> &str {
        self.category()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeWinner {
    /// 1 for first prize, 2 for second, ...
    pub place: usize,
    /// Index into the ranked results
    pub result_index: usize,
}

/// Winners of one prize category, in place order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPrizes {
    pub category: String,
    pub exclusive: bool,
    pub winners: Vec<PrizeWinner>,
}

/// Award prizes to `ranked` results, which must already be in ranked order.
///
/// Categories are visited from most to least general. First prizes are
/// settled in every category before any minor prize, so a fast team takes
/// the most general first prize it qualifies for. Within a category the
/// remaining places go to the best eligible results in ranked order.
///
/// A result can win in an exclusive category only if it holds no other
/// exclusive prize, and never wins twice in the same category.
pub fn allocate_prizes<T: PrizeCandidate>(ranked: &[T], table: &CategoryTable) -> Vec<CategoryPrizes> {
    let categories = table.prize_categories_by_generality();
    let mut allocation = PrizeAllocation::new(categories.len());

    for (c, category) in categories.iter().enumerate() {
        if category.prizes == 0 {
            continue;
        }
        if let Some(index) = allocation.next_winner(c, category, ranked, table) {
            allocation.award(c, category, index);
        }
    }

    for (c, category) in categories.iter().enumerate() {
        while allocation.winners[c].len() < category.prizes {
            match allocation.next_winner(c, category, ranked, table) {
                Some(index) => allocation.award(c, category, index),
                None => break,
            }
        }
    }

    let prizes: Vec<CategoryPrizes> = categories
        .iter()
        .zip(allocation.winners)
        .map(|(category, winners)| CategoryPrizes {
            category: category.name.clone(),
            exclusive: category.exclusive,
            winners: winners
                .into_iter()
                .enumerate()
                .map(|(i, result_index)| PrizeWinner {
                    place: i + 1,
                    result_index,
                })
                .collect(),
        })
        .collect();

    tracing::debug!(
        categories = prizes.len(),
        awarded = prizes.iter().map(|p| p.winners.len()).sum::<usize>(),
        "prizes allocated"
    );

    prizes
}

struct PrizeAllocation {
    /// Result indices per category, in place order
    winners: Vec<Vec<usize>>,
    exclusive_winners: HashSet<usize>,
}

impl PrizeAllocation {
    fn new(categories: usize) -> Self {
        Self {
            winners: vec![Vec::new(); categories],
            exclusive_winners: HashSet::new(),
        }
    }

    fn next_winner<T: PrizeCandidate>(
        &self,
        c: usize,
        category: &PrizeCategory,
        ranked: &[T],
        table: &CategoryTable,
    ) -> Option<usize> {
        ranked.iter().enumerate().find_map(|(index, result)| {
            let eligible = result.can_complete()
                && !self.winners[c].contains(&index)
                && !(category.exclusive && self.exclusive_winners.contains(&index))
                && table.is_eligible(result.entry_category(), category);
            eligible.then_some(index)
        })
    }

    fn award(&mut self, c: usize, category: &PrizeCategory, index: usize) {
        self.winners[c].push(index);
        if category.exclusive {
            self.exclusive_winners.insert(index);
        }
    }
}
