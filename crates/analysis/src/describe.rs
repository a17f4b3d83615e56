use std::collections::BTreeMap;

use normalizer::IssueState;

use crate::dataset::AnalysisRecord;
use crate::errors::Result;

/// Count, mean, sample standard deviation, min, quartiles and max.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// `None` for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: String,
    pub summary: Summary,
}

/// Linear-interpolation quantile of already sorted data (position
/// `q * (n - 1)`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    Some(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Non-null `value_column` values of open records, keyed by non-null
/// `group_column`, groups in lexical order.
pub fn open_samples(
    records: &[AnalysisRecord],
    group_column: &str,
    value_column: &str,
) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.state == IssueState::Open) {
        let Some(group) = record.group_key(group_column)? else {
            continue;
        };
        if let Some(value) = record.numeric(value_column)? {
            groups.entry(group.to_string()).or_default().push(value);
        }
    }
    Ok(groups)
}

/// Seven-number summary per group over open requests, ordered by median
/// and then by group name. Groups without any value are left out.
pub fn summarize_by_group(
    records: &[AnalysisRecord],
    group_column: &str,
    value_column: &str,
) -> Result<Vec<GroupSummary>> {
    let mut summaries: Vec<GroupSummary> = open_samples(records, group_column, value_column)?
        .into_iter()
        .filter_map(|(group, values)| describe(&values).map(|summary| GroupSummary { group, summary }))
        .collect();
    summaries.sort_by(|a, b| {
        a.summary
            .median
            .total_cmp(&b.summary.median)
            .then_with(|| a.group.cmp(&b.group))
    });
    Ok(summaries)
}

/// Row-normalised share of each state per group, over all records with a
/// non-null group.
#[derive(Debug, Clone, PartialEq)]
pub struct Crosstab {
    pub states: Vec<IssueState>,
    pub rows: Vec<CrosstabRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrosstabRow {
    pub group: String,
    pub total: usize,
    /// Aligned with [`Crosstab::states`].
    pub shares: Vec<f64>,
}

impl Crosstab {
    pub fn share(&self, group: &str, state: IssueState) -> Option<f64> {
        let column = self.states.iter().position(|s| *s == state)?;
        self.rows
            .iter()
            .find(|row| row.group == group)
            .map(|row| row.shares[column])
    }
}

pub fn crosstab_state_vs_group(records: &[AnalysisRecord], group_column: &str) -> Result<Crosstab> {
    let mut counts: BTreeMap<String, BTreeMap<IssueState, usize>> = BTreeMap::new();
    for record in records {
        if let Some(group) = record.group_key(group_column)? {
            *counts
                .entry(group.to_string())
                .or_default()
                .entry(record.state)
                .or_default() += 1;
        }
    }

    let states = vec![IssueState::Open, IssueState::Closed];
    let rows = counts
        .into_iter()
        .map(|(group, by_state)| {
            let total: usize = by_state.values().sum();
            let shares = states
                .iter()
                .map(|state| by_state.get(state).copied().unwrap_or(0) as f64 / total as f64)
                .collect();
            CrosstabRow {
                group,
                total,
                shares,
            }
        })
        .collect();
    Ok(Crosstab { states, rows })
}
