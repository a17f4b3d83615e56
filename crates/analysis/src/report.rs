use std::fmt::Write;

use chrono::NaiveDate;

use crate::describe::{Crosstab, GroupSummary};
use crate::significance::{DunnMatrix, KruskalWallis};

pub struct Report<'a> {
    pub as_of: NaiveDate,
    pub group_column: &'a str,
    pub value_column: &'a str,
    pub summaries: &'a [GroupSummary],
    pub crosstab: &'a Crosstab,
    pub kruskal: &'a KruskalWallis,
    pub dunn: &'a DunnMatrix,
}

pub fn render_report(report: &Report<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report<'_>) -> std::fmt::Result {
    writeln!(
        out,
        "Waiting time of open requests ({}) by {}, as of {}",
        report.value_column, report.group_column, report.as_of
    )?;
    let width = label_width(report.summaries.iter().map(|s| s.group.as_str()));
    writeln!(
        out,
        "{:<width$} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>6}",
        "", "50%", "25%", "75%", "max", "mean", "std", "count"
    )?;
    for row in report.summaries {
        let s = &row.summary;
        writeln!(
            out,
            "{:<width$} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>8} {:>6}",
            row.group,
            s.median,
            s.q25,
            s.q75,
            s.max,
            s.mean,
            s.std.map_or_else(|| "NaN".to_string(), |v| format!("{v:.0}")),
            s.count
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Share of requests by state")?;
    let width = label_width(report.crosstab.rows.iter().map(|r| r.group.as_str()));
    write!(out, "{:<width$}", "")?;
    for state in &report.crosstab.states {
        write!(out, " {:>8}", state.as_str())?;
    }
    writeln!(out)?;
    for row in &report.crosstab.rows {
        write!(out, "{:<width$}", row.group)?;
        for share in &row.shares {
            write!(out, " {share:>8.3}")?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "Kruskal-Wallis H-statistic: {}", report.kruskal.statistic)?;
    writeln!(out, "P-value: {}", report.kruskal.p_value)?;

    writeln!(out)?;
    writeln!(
        out,
        "Dunn's post-hoc test (p-adjust: {:?})",
        report.dunn.adjustment
    )?;
    let width = label_width(report.dunn.groups.iter().map(String::as_str));
    let cell = width.max(9);
    write!(out, "{:<width$}", "")?;
    for group in &report.dunn.groups {
        write!(out, " {group:>cell$}")?;
    }
    writeln!(out)?;
    for (group, row) in report.dunn.groups.iter().zip(&report.dunn.p_values) {
        write!(out, "{group:<width$}")?;
        for p in row {
            write!(out, " {p:>cell$.4e}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(str::len).max().unwrap_or(0).max(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{CrosstabRow, Summary};
    use common::config::PValueAdjustment;
    use normalizer::IssueState;

    #[test]
    fn renders_every_section() {
        let summaries = vec![GroupSummary {
            group: "EU".into(),
            summary: Summary {
                count: 2,
                mean: 50.0,
                std: Some(14.1),
                min: 40.0,
                q25: 45.0,
                median: 50.0,
                q75: 55.0,
                max: 60.0,
            },
        }];
        let crosstab = Crosstab {
            states: vec![IssueState::Open, IssueState::Closed],
            rows: vec![CrosstabRow {
                group: "EU".into(),
                total: 4,
                shares: vec![0.5, 0.5],
            }],
        };
        let kruskal = KruskalWallis {
            statistic: 1.5,
            p_value: 0.22,
            groups: 2,
            observations: 4,
        };
        let dunn = DunnMatrix {
            groups: vec!["AS".into(), "EU".into()],
            p_values: vec![vec![1.0, 0.22], vec![0.22, 1.0]],
            adjustment: PValueAdjustment::None,
        };
        let text = render_report(&Report {
            as_of: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            group_column: "pred",
            value_column: "wait_days",
            summaries: &summaries,
            crosstab: &crosstab,
            kruskal: &kruskal,
            dunn: &dunn,
        });
        assert!(text.contains("as of 2024-01-15"));
        assert!(text.contains("Kruskal-Wallis H-statistic: 1.5"));
        assert!(text.contains("P-value: 0.22"));
        assert!(text.contains("2.2000e-1"));
        assert!(text.lines().any(|l| l.starts_with("EU") && l.contains("0.500")));
    }
}
