//! Match statistics.

use serde::Serialize;

use super::MatchTable;

/// Summary statistics for a postcode-to-grid mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total_postcodes: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// 0.0 to 1.0, and 0.0 for an empty table
    pub match_rate: f64,
}

pub fn summarize_matches(table: &MatchTable) -> MatchSummary {
    let total = table.len();
    let matched = table
        .rows
        .iter()
        .filter(|r| r.matched_grid_id.is_some())
        .count();
    let unmatched = total - matched;

    let match_rate = if total > 0 {
        matched as f64 / total as f64
    } else {
        0.0
    };

    MatchSummary {
        total_postcodes: total,
        matched,
        unmatched,
        match_rate,
    }
}
