pub mod records;

// Expose the ParseError type
pub use records::ParseError;
// Expose the main loading functions
pub use records::{dose_records_from_reader, read_dose_records};
