use std::io::Write;
use std::path::Path;

use common::Result;
use normalizer::SupportRequest;

pub const COLUMNS: [&str; 10] = [
    "state",
    "created_at",
    "closed_at",
    "user_id",
    "real_name",
    "location",
    "last_name",
    "first_name",
    "duration",
    "duration_days",
];

/// Writes `records` as CSV. The header row is always present, even for an
/// empty harvest.
pub fn write_records<W: Write>(writer: W, records: &[SupportRequest]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(COLUMNS)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: impl AsRef<Path>, records: &[SupportRequest]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(std::io::BufWriter::new(file), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use normalizer::IssueState;

    fn record(state: IssueState) -> SupportRequest {
        let created = NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(9, 30, 0));
        let (closed, duration, days) = match state {
            IssueState::Closed => (
                created.map(|c| c + Duration::days(2) + Duration::hours(1)),
                Some(Duration::days(2) + Duration::hours(1)),
                Some(2),
            ),
            IssueState::Open => (None, None, None),
        };
        SupportRequest {
            state,
            created_at: created,
            closed_at: closed,
            user_id: "jdoe".into(),
            real_name: Some("Jane Doe, PhD".into()),
            location: Some("Unknown".into()),
            last_name: "PhD".into(),
            first_name: "Jane".into(),
            duration,
            duration_days: days,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_records(&mut out, &[record(IssueState::Closed), record(IssueState::Open)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "closed,2024-01-01 09:30:00,2024-01-03 10:30:00,jdoe,\"Jane Doe, PhD\",Unknown,PhD,Jane,2 days 01:00:00,2"
        );
        assert_eq!(
            lines[2],
            "open,2024-01-01 09:30:00,,jdoe,\"Jane Doe, PhD\",Unknown,PhD,Jane,,"
        );
    }

    #[test]
    fn empty_harvest_still_has_header() {
        let mut out = Vec::new();
        write_records(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), COLUMNS.join(","));
    }
}
