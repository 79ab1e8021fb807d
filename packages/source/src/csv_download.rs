//! Case table CSV reader.
//!
//! Parses the published case-count CSV into a [`CaseTable`], either from
//! a local file or from a single HTTP download. Rows that cannot be
//! parsed are skipped with a warning rather than failing the load.

use std::io::Read;
use std::path::Path;

use corona_stats_cases_models::AreaRecord;
use corona_stats_estimation::CaseTable;

use crate::SourceError;
use crate::parsing::{REQUIRED_COLUMNS, parse_count, parse_specimen_date};

/// Parses a case-count CSV.
///
/// The first row must be a header containing every column in
/// [`REQUIRED_COLUMNS`]; other columns are ignored and surrounding
/// whitespace is trimmed from headers and fields.
///
/// # Errors
///
/// * [`SourceError::MissingColumn`] if a required header is absent.
/// * [`SourceError::Csv`] if the header row cannot be read or the
///   underlying reader fails. Records that fail to decode are skipped.
pub fn parse_cases_csv<R: Read>(reader: R) -> Result<CaseTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();

    let mut indices = [0_usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SourceError::MissingColumn {
                column: column.to_string(),
            })?;
    }
    let [area_type_idx, area_name_idx, date_idx, daily_idx, cumulative_idx] = indices;

    let mut records = Vec::new();
    let mut skipped: u64 = 0;

    for (line, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping undecodable row {}: {e}", line + 2);
                skipped += 1;
                continue;
            }
        };
        let field = |i: usize| row.get(i).unwrap_or("");

        let parsed = (
            parse_specimen_date(field(date_idx)),
            parse_count(field(daily_idx)),
            parse_count(field(cumulative_idx)),
        );
        let (Some(specimen_date), Some(daily_count), Some(cumulative_count)) = parsed else {
            // +2: one for the header row, one for 1-based numbering.
            log::warn!("Skipping malformed row {}: {:?}", line + 2, row);
            skipped += 1;
            continue;
        };

        records.push(AreaRecord {
            area_type: field(area_type_idx).to_string(),
            area_name: field(area_name_idx).to_string(),
            specimen_date,
            daily_count,
            cumulative_count,
        });
    }

    log::info!("Parsed {} case rows ({skipped} skipped)", records.len());

    Ok(CaseTable::new(records))
}

/// Reads and parses a case-count CSV from disk.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened, or any error
/// from [`parse_cases_csv`].
pub fn load_cases_csv(path: &Path) -> Result<CaseTable, SourceError> {
    log::info!("Loading cases from {}", path.display());
    let file = std::fs::File::open(path)?;
    parse_cases_csv(std::io::BufReader::new(file))
}

/// Downloads and parses a case-count CSV with a single GET request.
///
/// There is no retry; a failed request is returned to the caller.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the request fails or the server
/// answers with an error status, or any error from [`parse_cases_csv`].
pub async fn fetch_cases_csv(url: &str) -> Result<CaseTable, SourceError> {
    log::info!("Downloading cases from {url}");
    let response = reqwest::get(url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());
    parse_cases_csv(&bytes[..])
}
