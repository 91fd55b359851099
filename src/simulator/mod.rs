pub mod equation;
mod parameters;
mod projection;
mod settings;
mod state;

use rayon::prelude::*;

use crate::{
    data::{DoseRecord, DoseSchedule},
    PharmlevelError,
};

pub use parameters::{MicroRates, PkParameters};
pub use projection::{project, LevelProfile, LevelSample, ProfileSummary};
pub use settings::{DosingPolicy, SimulationSettings, Solver};
pub use state::{AppliedDose, CompartmentState, SimulationTrace, TracePoint};

use equation::{integrate, simulate_ode, AnalyticalStepper};

/// Medication level engine
///
/// A [Simulator] turns dose records into projected levels in three stages:
/// the records are normalized into a [DoseSchedule], the schedule is integrated
/// on a fixed grid into a [SimulationTrace], and the trace is projected and
/// resampled into [LevelSample]s. Every call is independent; a [Simulator] is
/// freely shareable across threads.
///
/// # Example
///
/// ```rust
/// use chrono::{NaiveDate, NaiveTime};
/// use pharmlevel::prelude::*;
///
/// let records = vec![DoseRecord::new(
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
///     2.5,
/// )];
/// let levels = Simulator::default().levels(&records).unwrap();
/// assert_eq!(levels[0].timestamp(), records[0].datetime());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    parameters: PkParameters,
    settings: SimulationSettings,
}

impl Simulator {
    /// Create a simulator after validating parameters and settings
    pub fn new(
        parameters: PkParameters,
        settings: SimulationSettings,
    ) -> Result<Self, PharmlevelError> {
        parameters.validate()?;
        settings.validate()?;
        Ok(Simulator {
            parameters,
            settings,
        })
    }

    pub fn parameters(&self) -> &PkParameters {
        &self.parameters
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Integrate a schedule into a dense trace
    ///
    /// An empty schedule returns an empty trace without touching a solver.
    pub fn integrate(&self, schedule: &DoseSchedule) -> Result<SimulationTrace, PharmlevelError> {
        if schedule.is_empty() {
            return Ok(SimulationTrace::default());
        }
        match self.settings.solver {
            Solver::Ode => simulate_ode(schedule, &self.parameters, &self.settings),
            Solver::Analytical => {
                let mut stepper = AnalyticalStepper::new(self.parameters.micro_rates());
                integrate(&mut stepper, schedule, &self.parameters, &self.settings)
            }
        }
    }

    /// Run the full pipeline and keep the peak summary
    pub fn profile(&self, records: &[DoseRecord]) -> Result<LevelProfile, PharmlevelError> {
        let schedule = DoseSchedule::from_records(records);
        let Some(origin) = schedule.origin() else {
            return Ok(LevelProfile::default());
        };
        let trace = self.integrate(&schedule)?;
        project(
            &trace,
            origin,
            &self.parameters,
            self.settings.output_stride,
        )
    }

    /// Projected levels for a sorted list of dose records
    pub fn levels(&self, records: &[DoseRecord]) -> Result<Vec<LevelSample>, PharmlevelError> {
        Ok(self.profile(records)?.into_samples())
    }

    /// Evaluate independent dose histories in parallel
    ///
    /// Results are returned in the order of `histories`; a failing history does
    /// not affect the others.
    pub fn levels_batch(
        &self,
        histories: &[Vec<DoseRecord>],
    ) -> Vec<Result<Vec<LevelSample>, PharmlevelError>> {
        histories
            .par_iter()
            .map(|records| self.levels(records))
            .collect()
    }
}

/// Projected levels with the default parameters and settings
pub fn medication_levels(records: &[DoseRecord]) -> Result<Vec<LevelSample>, PharmlevelError> {
    Simulator::default().levels(records)
}
