//! CSV loading for the engagement dataset and the daily summary artifact.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::data::CoercionMode;

/// One row of `socialMedia.csv`, before type coercion
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "PostType")]
    pub post_type: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Likes")]
    pub likes: String,
}

/// One row of the daily summary file (`socialMediaTime.csv`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "AvgLikes")]
    pub avg_likes: String,
}

const RECORD_COLUMNS: [&str; 4] = ["Platform", "PostType", "Date", "Likes"];
const SUMMARY_COLUMNS: [&str; 2] = ["Date", "AvgLikes"];

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(false);
    builder
}

/// Deserialize every row, failing or skipping unreadable ones according to `mode`.
/// A missing column or an I/O failure is always an error.
fn read_rows<R, T>(reader: R, columns: &[&str], mode: CoercionMode, what: &str) -> Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut rdr = reader_builder().from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            bail!("Missing column '{}' in CSV header", column);
        }
    }

    let mut rows = Vec::new();
    for (idx, row) in rdr.deserialize().enumerate() {
        match row {
            Ok(value) => rows.push(value),
            Err(e) if mode == CoercionMode::Lenient && !matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                warn!(row = idx + 1, error = %e, "Skipping unreadable {} row", what);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {} row {}", what, idx + 1));
            }
        }
    }
    Ok(rows)
}

/// Deserialize engagement rows from any reader
pub fn read_records<R: Read>(reader: R, mode: CoercionMode) -> Result<Vec<RawRecord>> {
    let records = read_rows(reader, &RECORD_COLUMNS, mode, "CSV")?;
    debug!(rows = records.len(), "Read engagement rows");
    Ok(records)
}

/// Deserialize daily summary rows from any reader
pub fn read_daily_summary<R: Read>(reader: R, mode: CoercionMode) -> Result<Vec<SummaryRow>> {
    let rows = read_rows(reader, &SUMMARY_COLUMNS, mode, "summary")?;
    debug!(rows = rows.len(), "Read daily summary rows");
    Ok(rows)
}

/// Write daily summary rows with a `Date,AvgLikes` header
pub fn write_daily_summary<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to write summary row")?;
    }
    wtr.flush().context("Failed to flush summary CSV")?;
    Ok(())
}

/// Open a path for reading; `-` reads all of stdin
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read CSV from stdin")?;
        Ok(Box::new(io::Cursor::new(buf)))
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open '{}'", path.display()))?;
        Ok(Box::new(file))
    }
}
