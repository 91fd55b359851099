use crate::data::DoseRecord;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Custom error type for the module
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// Error encountered when reading CSV data
    #[error("CSV error: {0}")]
    CSVError(String),
    /// The DATE column could not be read as an ISO date
    #[error("Invalid date '{value}' on row {row}")]
    InvalidDate { value: String, row: usize },
    /// The TIME column could not be read as HH:MM or HH:MM:SS
    #[error("Invalid time '{value}' on row {row}")]
    InvalidTime { value: String, row: usize },
}

/// One row of a dose record file, before date and time are interpreted
#[derive(Debug, Deserialize)]
struct Row {
    date: String,
    time: String,
    dose: f64,
    #[serde(default)]
    notes: Option<String>,
}

impl Row {
    fn into_record(self, row: usize) -> Result<DoseRecord, ParseError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            ParseError::InvalidDate {
                value: self.date.clone(),
                row,
            }
        })?;
        let time = parse_time(self.time.trim()).ok_or_else(|| ParseError::InvalidTime {
            value: self.time.clone(),
            row,
        })?;
        let record = DoseRecord::new(date, time, self.dose);
        Ok(match self.notes {
            Some(notes) if !notes.is_empty() => record.with_notes(notes),
            _ => record,
        })
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

/// Read a CSV file of dose records
///
/// The file must have a header row with the columns `date`, `time`, `dose` and,
/// optionally, `notes`. Headers are case-insensitive and lines starting with `#`
/// are skipped. Rows are returned in file order.
///
/// # Example
///
/// ```rust,no_run
/// use pharmlevel::prelude::data::read_dose_records;
///
/// let records = read_dose_records("path/to/jabs.csv").unwrap();
/// println!("Number of doses: {}", records.len());
/// ```
pub fn read_dose_records(path: impl AsRef<Path>) -> Result<Vec<DoseRecord>, ParseError> {
    let file =
        std::fs::File::open(path.as_ref()).map_err(|e| ParseError::CSVError(e.to_string()))?;
    dose_records_from_reader(file)
}

/// Read dose records from any CSV source, see [read_dose_records]
pub fn dose_records_from_reader<R: Read>(reader: R) -> Result<Vec<DoseRecord>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    // Convert headers to lowercase
    let headers = reader
        .headers()
        .map_err(|e| ParseError::CSVError(e.to_string()))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<Vec<_>>();
    reader.set_headers(csv::StringRecord::from(headers));

    reader
        .deserialize::<Row>()
        .enumerate()
        .map(|(index, row)| {
            let row = row.map_err(|e| ParseError::CSVError(e.to_string()))?;
            row.into_record(index + 1)
        })
        .collect()
}
