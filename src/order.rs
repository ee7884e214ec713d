use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderMode {
    /// Largest clusters first; equal sizes keep creation order.
    ByFrequency,
    /// Descending by the key's (category, name).
    #[default]
    ByCategoryName,
}

impl OrderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderMode::ByFrequency => "by-frequency",
            OrderMode::ByCategoryName => "by-category-name",
        }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by-frequency" => Ok(OrderMode::ByFrequency),
            "by-category-name" => Ok(OrderMode::ByCategoryName),
            other => Err(format!("unknown order mode: {}", other)),
        }
    }
}

/// Sort clusters for output. Page lists are left untouched.
pub fn order_clusters(mut clusters: Vec<Cluster>, mode: OrderMode) -> Vec<Cluster> {
    match mode {
        OrderMode::ByFrequency => clusters.sort_by(|a, b| b.pages.len().cmp(&a.pages.len())),
        OrderMode::ByCategoryName => clusters.sort_by(|a, b| {
            b.key
                .category
                .cmp(&a.key.category)
                .then_with(|| b.key.name.cmp(&a.key.name))
        }),
    }
    clusters
}

/// Page indices in output order.
pub fn page_sequence(ordered: &[Cluster]) -> Vec<usize> {
    ordered.iter().flat_map(|c| c.pages.iter().copied()).collect()
}
