pub mod analytical;
pub mod ode;

use crate::{
    data::DoseSchedule,
    simulator::{
        AppliedDose, CompartmentState, DosingPolicy, PkParameters, SimulationSettings,
        SimulationTrace,
    },
    PharmlevelError,
};

pub use analytical::AnalyticalStepper;
pub use ode::simulate_ode;

/// Targets closer than this to the current time are treated as reached
pub(crate) const TIME_EPSILON: f64 = 1e-9;

/// Advances a compartment state through time.
///
/// Implementors own the state of one simulation run. The integrator drives them
/// grid point by grid point and injects doses in between.
pub trait Propagator {
    /// Current time in hours
    fn time(&self) -> f64;

    /// Current compartment amounts
    fn state(&self) -> CompartmentState;

    /// Instantaneously add `amount` (mg) to the absorption depot
    fn add_to_depot(&mut self, amount: f64);

    /// Integrate forward until `t`
    fn advance(&mut self, t: f64) -> Result<(), PharmlevelError>;
}

/// Integrate a dose schedule on the fixed grid of `settings`
///
/// The horizon extends `settings.tail_hours` past the last dose. At every grid
/// time the due doses are added to the depot, the state is advanced by one step
/// and the post-step state is recorded under the grid time it started from.
/// Every dose is applied exactly once; a dose the grid never reaches is an error.
pub fn integrate<P: Propagator>(
    propagator: &mut P,
    schedule: &DoseSchedule,
    parameters: &PkParameters,
    settings: &SimulationSettings,
) -> Result<SimulationTrace, PharmlevelError> {
    let Some(last_offset) = schedule.last_offset() else {
        return Ok(SimulationTrace::default());
    };
    let events = schedule.events();
    let dt = settings.step_hours;
    let horizon = last_offset + settings.tail_hours;
    let steps = settings.checked_step_count(horizon)?;
    tracing::debug!(
        doses = events.len(),
        horizon,
        steps,
        dosing = ?settings.dosing,
        "integrating dose schedule"
    );

    let mut trace = SimulationTrace::with_capacity(steps, events.len());
    let mut applied = vec![false; events.len()];
    // Dose indices by offset, equal offsets keep their record order
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| events[a].offset().total_cmp(&events[b].offset()));
    let mut cursor = 0;
    let half_step = dt / 2.0;

    for step in 0..steps {
        let time = step as f64 * dt;
        let next_time = (step + 1) as f64 * dt;

        match settings.dosing {
            DosingPolicy::NearestStep => {
                while let Some(&index) = order.get(cursor) {
                    let offset = events[index].offset();
                    if time - offset > half_step {
                        // Before the first grid point, left for the unapplied check
                        cursor += 1;
                    } else if (time - offset).abs() <= half_step {
                        let amount = parameters.f * events[index].amount();
                        inject(propagator, &mut trace, index, time, amount);
                        applied[index] = true;
                        cursor += 1;
                    } else {
                        break;
                    }
                }
            }
            DosingPolicy::ExactTime => {
                while let Some(&index) = order.get(cursor) {
                    if events[index].offset() >= next_time {
                        break;
                    }
                    let offset = events[index].offset().max(time);
                    propagator.advance(offset)?;
                    let amount = parameters.f * events[index].amount();
                    inject(propagator, &mut trace, index, offset, amount);
                    applied[index] = true;
                    cursor += 1;
                }
            }
        }

        propagator.advance(next_time)?;
        let state = propagator.state();
        if !state.is_finite() {
            tracing::error!(time = next_time, ?state, "non-finite compartment state");
            return Err(PharmlevelError::NonFiniteState {
                time: next_time,
                state: state.as_array(),
            });
        }
        trace.push(time, state);
    }

    if let Some(index) = applied.iter().position(|done| !done) {
        return Err(PharmlevelError::UnappliedDose {
            index,
            offset: events[index].offset(),
        });
    }
    Ok(trace)
}

fn inject<P: Propagator>(
    propagator: &mut P,
    trace: &mut SimulationTrace,
    index: usize,
    time: f64,
    amount: f64,
) {
    tracing::trace!(index, time, amount, "adding dose to depot");
    propagator.add_to_depot(amount);
    trace.record_dose(AppliedDose {
        index,
        time,
        amount,
    });
}
