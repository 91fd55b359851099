use std::marker::PhantomData;

use diffsol::{
    error::{DiffsolError, OdeSolverError},
    NalgebraLU, NalgebraMat, NalgebraVec, OdeBuilder, OdeEquations, OdeSolverMethod,
    OdeSolverStopReason, Vector,
};

use super::{integrate, Propagator, TIME_EPSILON};
use crate::{
    data::DoseSchedule,
    simulator::{CompartmentState, MicroRates, PkParameters, SimulationSettings, SimulationTrace},
    PharmlevelError,
};

type M = NalgebraMat<f64>;
type LS = NalgebraLU<f64>;

const NSTATES: usize = 3;
const H0: f64 = 1e-3;

/// Integrate a dose schedule with the diffsol BDF solver
///
/// One solver instance lives for the whole run; doses are written into its
/// state between stops, which makes the solver restart at first order.
pub fn simulate_ode(
    schedule: &DoseSchedule,
    parameters: &PkParameters,
    settings: &SimulationSettings,
) -> Result<SimulationTrace, PharmlevelError> {
    let rates = parameters.micro_rates();
    let problem = OdeBuilder::<M>::new()
        .rtol(settings.rtol)
        .atol([settings.atol])
        .t0(0.0)
        .h0(H0)
        .p([rates.ka, rates.ke, rates.kcp, rates.kpc])
        .rhs_implicit(
            |x, p, _t, dx| {
                // p = [ka, ke, kcp, kpc]
                dx[0] = -p[0] * x[0];
                dx[1] = p[0] * x[0] - p[1] * x[1] - p[2] * x[1] + p[3] * x[2];
                dx[2] = p[2] * x[1] - p[3] * x[2];
            },
            // The system is linear, so J*v is the right-hand side evaluated at v
            |_x, p, _t, v, y| {
                y[0] = -p[0] * v[0];
                y[1] = p[0] * v[0] - p[1] * v[1] - p[2] * v[1] + p[3] * v[2];
                y[2] = p[2] * v[1] - p[3] * v[2];
            },
        )
        .init(|_p, _t, x| x.fill(0.0), NSTATES)
        .build()?;

    let solver = problem.bdf::<LS>()?;
    let mut stepper = OdeStepper::new(solver, rates);
    integrate(&mut stepper, schedule, parameters, settings)
}

/// [Propagator] backed by a diffsol solver
pub struct OdeStepper<'a, Eqn, S>
where
    Eqn: OdeEquations + 'a,
    S: OdeSolverMethod<'a, Eqn>,
{
    solver: S,
    rates: MicroRates,
    problem: PhantomData<&'a Eqn>,
}

impl<'a, Eqn, S> OdeStepper<'a, Eqn, S>
where
    Eqn: OdeEquations + 'a,
    S: OdeSolverMethod<'a, Eqn>,
{
    pub fn new(solver: S, rates: MicroRates) -> Self {
        OdeStepper {
            solver,
            rates,
            problem: PhantomData,
        }
    }
}

impl<'a, Eqn, S> Propagator for OdeStepper<'a, Eqn, S>
where
    Eqn: OdeEquations<T = f64, V = NalgebraVec<f64>> + 'a,
    S: OdeSolverMethod<'a, Eqn>,
{
    fn time(&self) -> f64 {
        self.solver.state().t
    }

    fn state(&self) -> CompartmentState {
        let y = self.solver.state().y;
        CompartmentState::new(y[0], y[1], y[2])
    }

    fn add_to_depot(&mut self, amount: f64) {
        let mut x = self.state().as_array();
        x[0] += amount;
        // Keep dy consistent with y, the restart uses it as the first derivative
        let mut dx = [0.0; NSTATES];
        self.rates.derivative(x, &mut dx);

        let state = self.solver.state_mut();
        for i in 0..NSTATES {
            state.y[i] = x[i];
            state.dy[i] = dx[i];
        }
    }

    fn advance(&mut self, t: f64) -> Result<(), PharmlevelError> {
        if t - self.time() <= TIME_EPSILON {
            return Ok(());
        }
        match self.solver.set_stop_time(t) {
            Ok(_) => {}
            Err(DiffsolError::OdeSolverError(OdeSolverError::StopTimeAtCurrentTime)) => {
                return Ok(())
            }
            Err(err) => return Err(err.into()),
        }
        loop {
            match self.solver.step() {
                Ok(OdeSolverStopReason::InternalTimestep) => continue,
                Ok(OdeSolverStopReason::TstopReached) => break,
                Ok(OdeSolverStopReason::RootFound(_)) => continue,
                Err(DiffsolError::OdeSolverError(OdeSolverError::StepSizeTooSmall { time })) => {
                    return Err(PharmlevelError::StepSizeTooSmall { time });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
