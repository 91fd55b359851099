pub mod parser;
pub mod record;
pub mod schedule;
pub use record::DoseRecord;
pub use schedule::{DoseEvent, DoseSchedule};
