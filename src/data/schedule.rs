use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::DoseRecord;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// A dose expressed relative to the first dose of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    amount: f64,
    offset: f64,
}

impl DoseEvent {
    /// Create a new dose event
    ///
    /// # Arguments
    ///
    /// * `amount` - Administered amount in mg
    /// * `offset` - Hours elapsed since the first dose of the schedule
    pub fn new(amount: f64, offset: f64) -> Self {
        DoseEvent { amount, offset }
    }

    /// Administered amount in mg
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Hours elapsed since the first dose
    pub fn offset(&self) -> f64 {
        self.offset
    }
}

/// A time-relative dose schedule anchored at the first dose
///
/// The schedule is the output of normalizing a list of [DoseRecord]s. The first
/// event always has an offset of exactly `0.0` and every other offset is the
/// wall-clock difference, in fractional hours, from the first record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoseSchedule {
    origin: Option<NaiveDateTime>,
    events: Vec<DoseEvent>,
}

impl DoseSchedule {
    /// Normalize dose records into a schedule
    ///
    /// Records must already be sorted ascending by date and time; they are not
    /// re-sorted. An empty slice yields an empty schedule without an origin.
    pub fn from_records(records: &[DoseRecord]) -> Self {
        let Some(first) = records.first() else {
            return DoseSchedule::default();
        };
        let origin = first.datetime();
        let events = records
            .iter()
            .map(|record| {
                let elapsed = record.datetime() - origin;
                let hours = elapsed.num_milliseconds() as f64 / (1000.0 * SECONDS_PER_HOUR);
                DoseEvent::new(record.dose(), hours)
            })
            .collect();
        DoseSchedule {
            origin: Some(origin),
            events,
        }
    }

    /// Build a schedule from already time-relative events
    pub fn new(origin: NaiveDateTime, events: Vec<DoseEvent>) -> Self {
        DoseSchedule {
            origin: Some(origin),
            events,
        }
    }

    /// Absolute time of the first dose, `None` for an empty schedule
    pub fn origin(&self) -> Option<NaiveDateTime> {
        self.origin
    }

    pub fn events(&self) -> &[DoseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Largest dose offset in hours, `None` for an empty schedule
    pub fn last_offset(&self) -> Option<f64> {
        self.events.iter().map(|e| e.offset).reduce(f64::max)
    }

    /// Sum of all administered amounts in mg
    pub fn total_amount(&self) -> f64 {
        self.events.iter().map(|e| e.amount).sum()
    }
}

impl From<&[DoseRecord]> for DoseSchedule {
    fn from(records: &[DoseRecord]) -> Self {
        DoseSchedule::from_records(records)
    }
}
