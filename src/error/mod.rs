use thiserror::Error;

use crate::data::parser::ParseError;

#[derive(Error, Debug)]
pub enum PharmlevelError {
    #[error("Invalid PK parameter {name} = {value}: must be finite and positive")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("Invalid simulation setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
    #[error("Non-finite compartment state at t = {time} h: {state:?}")]
    NonFiniteState { time: f64, state: [f64; 3] },
    #[error("The step size of the ODE solver went to zero at t = {time} h, check the PK parameters")]
    StepSizeTooSmall { time: f64 },
    #[error("Dose {index} at offset {offset} h was never applied to the depot")]
    UnappliedDose { index: usize, offset: f64 },
    #[error("Simulation horizon of {horizon} h needs {steps} steps, exceeding the cap of {max_steps}")]
    HorizonTooLong {
        horizon: f64,
        steps: usize,
        max_steps: usize,
    },
    #[error("Timestamp overflow when adding {hours} h to the first dose time")]
    TimestampOverflow { hours: f64 },
    #[error("Error in the ODE solver: {0}")]
    SolverError(#[from] diffsol::error::DiffsolError),
    #[error("Error parsing dose records: {0}")]
    ParseError(#[from] ParseError),
    #[error("Error reading configuration: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
