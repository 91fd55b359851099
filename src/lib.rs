pub mod config;
pub mod data;
pub mod error;
pub mod simulator;

pub use crate::config::EngineConfig;
pub use crate::data::*;
pub use crate::simulator::equation::{self, Propagator};
pub use crate::simulator::{
    medication_levels, CompartmentState, DosingPolicy, LevelProfile, LevelSample, PkParameters,
    ProfileSummary, SimulationSettings, SimulationTrace, Simulator, Solver,
};
pub use error::PharmlevelError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            parser::{dose_records_from_reader, read_dose_records},
            DoseEvent, DoseRecord, DoseSchedule,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{
            equation,
            equation::{AnalyticalStepper, Propagator},
            project, AppliedDose, CompartmentState, DosingPolicy, LevelProfile, LevelSample,
            MicroRates, PkParameters, ProfileSummary, SimulationSettings, SimulationTrace,
            Simulator, Solver, TracePoint,
        };
    }

    pub use crate::data::{DoseEvent, DoseRecord, DoseSchedule};
    pub use crate::simulator::{
        medication_levels, LevelSample, PkParameters, SimulationSettings, Simulator,
    };
    pub use crate::{EngineConfig, PharmlevelError};
}
