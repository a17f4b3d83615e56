//! Waiting time "so far" for requests that are still open.
//!
//! The value depends on the date the analysis is run, so two runs over the
//! same file can disagree. It is kept apart from the harvest-time
//! `duration_days`.

use chrono::NaiveDate;
use normalizer::IssueState;

use crate::dataset::AnalysisRecord;

/// Sets `wait_days` on every record: `(as_of - created date) + 1` whole
/// days for open requests, time of day ignored; the harvest-time
/// `duration_days` for closed ones.
pub fn recompute_open_wait(records: &mut [AnalysisRecord], as_of: NaiveDate) {
    for record in records.iter_mut() {
        record.wait_days = match record.state {
            IssueState::Open => record
                .created_at
                .map(|created| (as_of - created.date()).num_days() + 1),
            IssueState::Closed => record.duration_days,
        };
    }
}
