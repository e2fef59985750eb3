//! Quick similarity ratio.
//!
//! An upper bound on the true matching-blocks ratio: it only compares
//! character multisets, so it ignores order entirely. Counting the query
//! once and then making one pass per candidate keeps a full catalog scan
//! linear.

use std::collections::HashMap;

/// Character counts of one side of the comparison, reusable across many
/// candidates.
#[derive(Debug, Clone)]
pub struct QuickRatio {
    counts: HashMap<char, usize>,
    len: usize,
}

impl QuickRatio {
    pub fn new(reference: &str) -> Self {
        let mut counts = HashMap::new();
        let mut len = 0;
        for c in reference.chars() {
            *counts.entry(c).or_insert(0) += 1;
            len += 1;
        }
        Self { counts, len }
    }

    /// `2 * M / (len(reference) + len(candidate))`, where `M` sums the
    /// per-character minimum of both counts. Two empty strings score 1.0.
    pub fn ratio(&self, candidate: &str) -> f64 {
        let mut available: HashMap<char, usize> = HashMap::with_capacity(self.counts.len());
        let mut matches = 0usize;
        let mut candidate_len = 0usize;

        for c in candidate.chars() {
            candidate_len += 1;
            let left = available
                .entry(c)
                .or_insert_with(|| self.counts.get(&c).copied().unwrap_or(0));
            if *left > 0 {
                *left -= 1;
                matches += 1;
            }
        }

        let total = self.len + candidate_len;
        if total == 0 {
            return 1.0;
        }
        2.0 * matches as f64 / total as f64
    }
}

pub fn quick_ratio(a: &str, b: &str) -> f64 {
    QuickRatio::new(b).ratio(a)
}
