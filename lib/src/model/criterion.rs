//! Node impurity measures used to score candidate splits.

use serde::{Deserialize, Serialize};

/// Impurity measure over a node's weighted class counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: `1 - Σ pₖ²`.
    #[default]
    Gini,
    /// Shannon entropy in bits: `-Σ pₖ log₂ pₖ`.
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node given the (possibly weighted) count of each class.
    ///
    /// An empty node has zero impurity.
    pub fn impurity(&self, class_counts: &[f64]) -> f64 {
        let total: f64 = class_counts.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c / total;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => class_counts
                .iter()
                .filter(|&&c| c > 0.0)
                .map(|&c| {
                    let p = c / total;
                    -p * p.log2()
                })
                .sum(),
        }
    }
}
