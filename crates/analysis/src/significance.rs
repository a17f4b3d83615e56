//! Rank-based comparison of waiting times across groups: Kruskal-Wallis as
//! the omnibus test and Dunn's test for the pairwise follow-up.

use std::collections::BTreeMap;

use common::config::PValueAdjustment;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use tracing::debug;

use crate::adjust::adjust_p_values;
use crate::dataset::AnalysisRecord;
use crate::describe::open_samples;
use crate::errors::{AnalysisError, Result};
use crate::ranks::rank_average;

#[derive(Debug, Clone, PartialEq)]
pub struct KruskalWallis {
    /// Tie-corrected H statistic.
    pub statistic: f64,
    pub p_value: f64,
    pub groups: usize,
    pub observations: usize,
}

/// Symmetric matrix of pairwise p-values; the diagonal is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct DunnMatrix {
    pub groups: Vec<String>,
    pub p_values: Vec<Vec<f64>>,
    pub adjustment: PValueAdjustment,
}

impl DunnMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.groups.iter().position(|g| g == a)?;
        let j = self.groups.iter().position(|g| g == b)?;
        Some(self.p_values[i][j])
    }
}

/// Kruskal-Wallis over open requests with a non-null group.
pub fn test_group_wait_equality(
    records: &[AnalysisRecord],
    group_column: &str,
    value_column: &str,
) -> Result<KruskalWallis> {
    let samples = comparable_samples(records, group_column, value_column)?;
    let values: Vec<Vec<f64>> = samples.into_values().collect();
    kruskal_wallis(&values)
}

/// Dunn's test over the same rows as [`test_group_wait_equality`].
pub fn pairwise_posthoc(
    records: &[AnalysisRecord],
    group_column: &str,
    value_column: &str,
    adjustment: PValueAdjustment,
) -> Result<DunnMatrix> {
    let samples = comparable_samples(records, group_column, value_column)?;
    dunn(&samples, adjustment)
}

fn comparable_samples(
    records: &[AnalysisRecord],
    group_column: &str,
    value_column: &str,
) -> Result<BTreeMap<String, Vec<f64>>> {
    let samples = open_samples(records, group_column, value_column)?;
    if samples.len() < 2 {
        return Err(AnalysisError::TooFewGroups {
            found: samples.len(),
        });
    }
    debug!(
        groups = samples.len(),
        observations = samples.values().map(Vec::len).sum::<usize>(),
        "comparing open requests"
    );
    Ok(samples)
}

pub fn kruskal_wallis(samples: &[Vec<f64>]) -> Result<KruskalWallis> {
    let non_empty = samples.iter().filter(|s| !s.is_empty()).count();
    if non_empty < 2 {
        return Err(AnalysisError::TooFewGroups { found: non_empty });
    }

    let pooled: Vec<f64> = samples.iter().flatten().copied().collect();
    let n = pooled.len() as f64;
    let ranking = rank_average(&pooled);
    let tie_correction = 1.0 - ranking.tie_sum() / (n * n * n - n);
    if tie_correction <= 0.0 {
        return Err(AnalysisError::IdenticalValues);
    }

    let mut offset = 0;
    let mut rank_term = 0.0;
    for sample in samples.iter().filter(|s| !s.is_empty()) {
        let rank_sum: f64 = ranking.ranks[offset..offset + sample.len()].iter().sum();
        rank_term += rank_sum * rank_sum / sample.len() as f64;
        offset += sample.len();
    }
    let h = (12.0 / (n * (n + 1.0)) * rank_term - 3.0 * (n + 1.0)) / tie_correction;

    let chi2 = ChiSquared::new((non_empty - 1) as f64)
        .map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    Ok(KruskalWallis {
        statistic: h,
        p_value: chi2.sf(h),
        groups: non_empty,
        observations: pooled.len(),
    })
}

/// Dunn's z-test on mean ranks with the tie-corrected variance, two-sided.
pub fn dunn(samples: &BTreeMap<String, Vec<f64>>, adjustment: PValueAdjustment) -> Result<DunnMatrix> {
    let groups: Vec<(&String, &Vec<f64>)> = samples.iter().filter(|(_, v)| !v.is_empty()).collect();
    if groups.len() < 2 {
        return Err(AnalysisError::TooFewGroups {
            found: groups.len(),
        });
    }

    let pooled: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let n = pooled.len() as f64;
    let ranking = rank_average(&pooled);
    let variance_base = n * (n + 1.0) / 12.0 - ranking.tie_sum() / (12.0 * (n - 1.0));
    if variance_base <= 0.0 {
        return Err(AnalysisError::IdenticalValues);
    }

    let mut mean_ranks = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for (_, values) in &groups {
        let sum: f64 = ranking.ranks[offset..offset + values.len()].iter().sum();
        mean_ranks.push(sum / values.len() as f64);
        offset += values.len();
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    let k = groups.len();
    let mut pairs = Vec::with_capacity(k * (k - 1) / 2);
    let mut raw = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let weight = 1.0 / groups[i].1.len() as f64 + 1.0 / groups[j].1.len() as f64;
            let z = (mean_ranks[i] - mean_ranks[j]).abs() / (variance_base * weight).sqrt();
            pairs.push((i, j));
            raw.push((2.0 * normal.sf(z)).min(1.0));
        }
    }

    let adjusted = adjust_p_values(&raw, adjustment);
    let mut p_values = vec![vec![1.0; k]; k];
    for (&(i, j), p) in pairs.iter().zip(adjusted) {
        p_values[i][j] = p;
        p_values[j][i] = p;
    }

    Ok(DunnMatrix {
        groups: groups.into_iter().map(|(g, _)| g.clone()).collect(),
        p_values,
        adjustment,
    })
}
