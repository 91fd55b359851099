use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single recorded injection, as handed over by the persistence layer.
///
/// Records are expected to be sorted ascending by `(date, time)` and to carry a
/// positive dose; neither property is re-checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRecord {
    date: NaiveDate,
    time: NaiveTime,
    dose: f64,
    #[serde(default)]
    notes: Option<String>,
}

impl DoseRecord {
    /// Create a new dose record
    ///
    /// # Arguments
    ///
    /// * `date` - Calendar date of the injection
    /// * `time` - Time of day of the injection
    /// * `dose` - Administered amount in mg
    pub fn new(date: NaiveDate, time: NaiveTime, dose: f64) -> Self {
        DoseRecord {
            date,
            time,
            dose,
            notes: None,
        }
    }

    /// Attach free-text notes to the record
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Administered amount in mg
    pub fn dose(&self) -> f64 {
        self.dose
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Combined date and time of the injection
    pub fn datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}
