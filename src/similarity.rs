use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::extract::Record;

pub const NAME_WEIGHT: f64 = 0.7;
pub const CATEGORY_WEIGHT: f64 = 0.3;

/// The two string measures the scorer needs. Both return 0..=100 and must be symmetric.
pub trait StringSimilarity {
    /// Character-level edit-distance ratio.
    fn ratio(&self, a: &str, b: &str) -> u8;
    /// Ratio over the sets of whitespace-delimited tokens, ignoring order and repeats.
    fn token_set_ratio(&self, a: &str, b: &str) -> u8;
}

/// Levenshtein ratio with insert/delete edits, the measure used by common fuzzy-matching
/// libraries (`ratio`, `token_set_ratio`).
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyRatio;

impl StringSimilarity for FuzzyRatio {
    fn ratio(&self, a: &str, b: &str) -> u8 {
        if a == b {
            return 100;
        }
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let matched = 2 * lcs_len(&a, &b);
        percent(matched as f64 / total as f64)
    }

    fn token_set_ratio(&self, a: &str, b: &str) -> u8 {
        let pa = process(a);
        let pb = process(b);
        if pa.is_empty() || pb.is_empty() {
            return 0;
        }
        let ta: BTreeSet<&str> = pa.split_whitespace().collect();
        let tb: BTreeSet<&str> = pb.split_whitespace().collect();

        let sect = join_sorted(ta.intersection(&tb));
        let diff_ab = join_sorted(ta.difference(&tb));
        let diff_ba = join_sorted(tb.difference(&ta));
        let combined_ab = format!("{} {}", sect, diff_ab).trim().to_string();
        let combined_ba = format!("{} {}", sect, diff_ba).trim().to_string();

        [
            self.ratio(&sect, &combined_ab),
            self.ratio(&sect, &combined_ba),
            self.ratio(&combined_ab, &combined_ba),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Closeness of two records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub name: u8,
    pub category: u8,
    pub combined: f64,
}

pub fn score_records(a: &Record, b: &Record) -> Score {
    score_with(&FuzzyRatio, a, b)
}

pub fn score_with<S: StringSimilarity + ?Sized>(sim: &S, a: &Record, b: &Record) -> Score {
    let name = sim.ratio(&a.name.to_lowercase(), &b.name.to_lowercase());
    let category = sim.token_set_ratio(&a.category.to_lowercase(), &b.category.to_lowercase());
    Score {
        name,
        category,
        combined: NAME_WEIGHT * name as f64 + CATEGORY_WEIGHT * category as f64,
    }
}

// length of the longest common subsequence; indel distance = |a| + |b| - 2 * lcs
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn percent(r: f64) -> u8 {
    (100.0 * r).round_ties_even().clamp(0.0, 100.0) as u8
}

// everything but word characters (alphanumerics and '_') becomes a space, lower-cased, trimmed
fn process(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    mapped.to_lowercase().trim().to_string()
}

fn join_sorted<T: AsRef<str>>(tokens: impl Iterator<Item = T>) -> String {
    tokens.map(|t| t.as_ref().to_string()).collect::<Vec<_>>().join(" ")
}
