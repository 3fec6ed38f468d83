use crate::binder::Binding;
use serde::{Deserialize, Serialize};

/// Summary statistics for one binding pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindingSummary {
    pub features: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute statistics over the matched values of a binding.
pub fn binding_summary(binding: &Binding) -> BindingSummary {
    let mut vals = binding.matched_values();
    vals.sort_by(|a, b| a.total_cmp(b));
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    BindingSummary {
        features: binding.features.len(),
        matched: count,
        unmatched: binding.features.len() - count,
        min,
        max,
        mean,
        median,
    }
}
