use serde::{Deserialize, Serialize};

use crate::extract::Record;
use crate::similarity::{score_with, FuzzyRatio, Score, StringSimilarity};

/// A record together with the zero-based page it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub record: Record,
    pub page_index: usize,
}

impl PageEntry {
    pub fn new(record: Record, page_index: usize) -> Self {
        PageEntry { record, page_index }
    }
}

/// Pages believed to show the same product. `key` is the record of the page that opened the
/// cluster and never changes; `pages` keeps arrival order and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub key: Record,
    pub pages: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub name: u8,
    pub category: u8,
    /// Require `category` as well as `name` before a cluster is a candidate.
    pub category_gate: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { name: 80, category: 99, category_gate: false }
    }
}

impl Thresholds {
    fn admits(&self, score: &Score) -> bool {
        score.name >= self.name && (!self.category_gate || score.category >= self.category)
    }
}

/// Where `Clusterer::assign` put an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assignment {
    Joined { cluster: usize, score: Score },
    Created { cluster: usize },
}

/// Single-pass greedy clusterer. Clusters are kept in creation order, which is also the scan
/// order; the first of several equally scoring clusters wins.
#[derive(Debug, Clone)]
pub struct Clusterer<S = FuzzyRatio> {
    thresholds: Thresholds,
    similarity: S,
    clusters: Vec<Cluster>,
}

impl Clusterer<FuzzyRatio> {
    pub fn new(thresholds: Thresholds) -> Self {
        Clusterer::with_similarity(thresholds, FuzzyRatio)
    }
}

impl<S: StringSimilarity> Clusterer<S> {
    pub fn with_similarity(thresholds: Thresholds, similarity: S) -> Self {
        Clusterer { thresholds, similarity, clusters: Vec::new() }
    }

    pub fn assign(&mut self, entry: PageEntry) -> Assignment {
        let mut best: Option<(usize, Score)> = None;
        for (idx, cluster) in self.clusters.iter().enumerate() {
            let score = score_with(&self.similarity, &cluster.key, &entry.record);
            if !self.thresholds.admits(&score) {
                continue;
            }
            match best {
                Some((_, b)) if score.combined <= b.combined => {}
                _ => best = Some((idx, score)),
            }
        }

        match best {
            Some((idx, score)) => {
                self.clusters[idx].pages.push(entry.page_index);
                Assignment::Joined { cluster: idx, score }
            }
            None => {
                self.clusters.push(Cluster { key: entry.record, pages: vec![entry.page_index] });
                Assignment::Created { cluster: self.clusters.len() - 1 }
            }
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }
}

/// Cluster a whole page sequence in the given order.
pub fn cluster_entries<I>(entries: I, thresholds: Thresholds) -> Vec<Cluster>
where
    I: IntoIterator<Item = PageEntry>,
{
    let mut clusterer = Clusterer::new(thresholds);
    for entry in entries {
        clusterer.assign(entry);
    }
    clusterer.into_clusters()
}
