use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::warn;

use crate::csv_reader::{RawRecord, SummaryRow};
use crate::ir::DailyAverage;
use crate::parser::parse_slash_date;

/// One engagement observation, with typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub platform: String,
    pub post_type: String,
    pub date: NaiveDate,
    pub likes: i64,
}

/// A field that could not be coerced to its typed form. Rows are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("row {row}: Likes value '{value}' is not an integer")]
    InvalidLikes { row: usize, value: String },
    #[error("row {row}: Date value '{value}' is not a recognized date")]
    InvalidDate { row: usize, value: String },
    #[error("row {row}: AvgLikes value '{value}' is not a number")]
    InvalidAverage { row: usize, value: String },
}

/// How malformed rows are treated during coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    /// Skip the row and log a warning
    #[default]
    Lenient,
    /// Fail on the first malformed row
    Strict,
}

/// Parse a calendar date from `M/D/YYYY (Weekday)`, `M/D/YYYY` or `YYYY-MM-DD`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok((_, slash)) = parse_slash_date(text) {
        let date = NaiveDate::from_ymd_opt(slash.year, slash.month, slash.day)?;
        if let Some(weekday) = slash.weekday {
            if weekday != date.weekday() {
                warn!(
                    value = text,
                    expected = %date.weekday(),
                    found = %weekday,
                    "Weekday does not match date, using the date"
                );
            }
        }
        return Some(date);
    }
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Coerce a single raw row. `row` is the 1-based data row number.
pub fn coerce_record(row: usize, raw: &RawRecord) -> Result<Record, CoercionError> {
    let likes = raw.likes.trim().parse::<i64>().map_err(|_| CoercionError::InvalidLikes {
        row,
        value: raw.likes.clone(),
    })?;
    let date = parse_date(&raw.date).ok_or_else(|| CoercionError::InvalidDate {
        row,
        value: raw.date.clone(),
    })?;

    Ok(Record {
        platform: raw.platform.clone(),
        post_type: raw.post_type.clone(),
        date,
        likes,
    })
}

/// Coerce all rows according to `mode`
pub fn coerce_records(raw: &[RawRecord], mode: CoercionMode) -> Result<Vec<Record>, CoercionError> {
    collect_coerced(raw, mode, coerce_record)
}

/// Coerce one row of the daily summary artifact
pub fn coerce_summary_row(row: usize, raw: &SummaryRow) -> Result<DailyAverage, CoercionError> {
    let date = parse_date(&raw.date).ok_or_else(|| CoercionError::InvalidDate {
        row,
        value: raw.date.clone(),
    })?;
    let avg_likes = raw
        .avg_likes
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoercionError::InvalidAverage {
            row,
            value: raw.avg_likes.clone(),
        })?;

    Ok(DailyAverage { date, avg_likes })
}

/// Coerce all summary rows according to `mode`, ordered by date
pub fn coerce_summary(raw: &[SummaryRow], mode: CoercionMode) -> Result<Vec<DailyAverage>, CoercionError> {
    let mut daily = collect_coerced(raw, mode, coerce_summary_row)?;
    daily.sort_by_key(|d| d.date);
    Ok(daily)
}

fn collect_coerced<R, T, F>(raw: &[R], mode: CoercionMode, coerce: F) -> Result<Vec<T>, CoercionError>
where
    F: Fn(usize, &R) -> Result<T, CoercionError>,
{
    let mut out = Vec::with_capacity(raw.len());
    for (idx, row) in raw.iter().enumerate() {
        match coerce(idx + 1, row) {
            Ok(value) => out.push(value),
            Err(e) => match mode {
                CoercionMode::Strict => return Err(e),
                CoercionMode::Lenient => warn!(error = %e, "Skipping malformed row"),
            },
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(platform: &str, post_type: &str, date: &str, likes: &str) -> RawRecord {
        RawRecord {
            platform: platform.to_string(),
            post_type: post_type.to_string(),
            date: date.to_string(),
            likes: likes.to_string(),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("3/1/2024 (Friday)"), Some(expected));
        assert_eq!(parse_date("3/1/2024"), Some(expected));
        assert_eq!(parse_date("2024-03-01"), Some(expected));
    }

    #[test]
    fn test_parse_date_weekday_mismatch_keeps_date() {
        // 3/1/2024 is a Friday
        assert_eq!(parse_date("3/1/2024 (Monday)"), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date("2/30/2024"), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_coerce_record_ok() {
        let record = coerce_record(1, &raw("Instagram", "Video", "3/2/2024 (Saturday)", "42")).unwrap();
        assert_eq!(record.platform, "Instagram");
        assert_eq!(record.post_type, "Video");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(record.likes, 42);
    }

    #[test]
    fn test_coerce_record_bad_likes() {
        let err = coerce_record(7, &raw("Instagram", "Video", "3/2/2024", "lots")).unwrap_err();
        assert_eq!(err, CoercionError::InvalidLikes { row: 7, value: "lots".to_string() });
        assert_eq!(err.to_string(), "row 7: Likes value 'lots' is not an integer");
    }

    #[test]
    fn test_coerce_record_bad_date() {
        let err = coerce_record(2, &raw("Instagram", "Video", "soon", "3")).unwrap_err();
        assert!(matches!(err, CoercionError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn test_coerce_records_lenient_skips() {
        let rows = vec![
            raw("A", "X", "3/1/2024", "10"),
            raw("A", "X", "3/1/2024", "NaN"),
            raw("B", "Y", "3/2/2024", "5"),
        ];
        let records = coerce_records(&rows, CoercionMode::Lenient).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].platform, "B");
    }

    #[test]
    fn test_coerce_records_strict_fails() {
        let rows = vec![raw("A", "X", "3/1/2024", "10"), raw("A", "X", "bad", "1")];
        let err = coerce_records(&rows, CoercionMode::Strict).unwrap_err();
        assert!(matches!(err, CoercionError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn test_coerce_summary_sorted_by_date() {
        let rows = vec![
            SummaryRow { date: "3/2/2024 (Saturday)".to_string(), avg_likes: "20.000".to_string() },
            SummaryRow { date: "3/1/2024 (Friday)".to_string(), avg_likes: "12.500".to_string() },
        ];
        let daily = coerce_summary(&rows, CoercionMode::Strict).unwrap();
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(daily[0].avg_likes, 12.5);
        assert_eq!(daily[1].avg_likes, 20.0);
    }

    #[test]
    fn test_coerce_summary_bad_average() {
        let rows = vec![SummaryRow { date: "3/2/2024".to_string(), avg_likes: "n/a".to_string() }];
        let err = coerce_summary(&rows, CoercionMode::Strict).unwrap_err();
        assert!(matches!(err, CoercionError::InvalidAverage { row: 1, .. }));
    }
}
