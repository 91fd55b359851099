use serde::{Deserialize, Serialize};

use crate::PharmlevelError;

/// How doses are placed on the fixed stepping grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosingPolicy {
    /// Apply each dose at the first grid point within half a step of its offset
    #[default]
    NearestStep,
    /// Split the integration at the exact dose offset.
    ///
    /// This shifts the numeric output relative to [DosingPolicy::NearestStep].
    ExactTime,
}

/// Method used to advance the compartment state between grid points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Adaptive BDF integration of the ODE system
    #[default]
    Ode,
    /// Closed-form solution of the linear system
    Analytical,
}

/// Numerical and output settings for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fixed grid step in hours
    pub step_hours: f64,
    /// Hours simulated past the last dose
    pub tail_hours: f64,
    /// Keep every `output_stride`-th trace point in the output
    pub output_stride: usize,
    pub dosing: DosingPolicy,
    pub solver: Solver,
    /// Relative tolerance of the ODE solver
    pub rtol: f64,
    /// Absolute tolerance of the ODE solver
    pub atol: f64,
    /// Refuse horizons needing more grid steps than this
    pub max_steps: Option<usize>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            step_hours: 0.5,
            tail_hours: 14.0 * 24.0,
            output_stride: 2,
            dosing: DosingPolicy::default(),
            solver: Solver::default(),
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: None,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), PharmlevelError> {
        if !self.step_hours.is_finite() || self.step_hours <= 0.0 {
            return Err(PharmlevelError::InvalidSetting {
                name: "step_hours",
                reason: format!("{} is not a positive step", self.step_hours),
            });
        }
        if !self.tail_hours.is_finite() || self.tail_hours < 0.0 {
            return Err(PharmlevelError::InvalidSetting {
                name: "tail_hours",
                reason: format!("{} is not a non-negative duration", self.tail_hours),
            });
        }
        if self.output_stride == 0 {
            return Err(PharmlevelError::InvalidSetting {
                name: "output_stride",
                reason: "must be at least 1".to_string(),
            });
        }
        for (name, tol) in [("rtol", self.rtol), ("atol", self.atol)] {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(PharmlevelError::InvalidSetting {
                    name,
                    reason: format!("{} is not a positive tolerance", tol),
                });
            }
        }
        Ok(())
    }

    /// Number of grid points covering `[0, horizon]`, both ends included
    pub fn step_count(&self, horizon: f64) -> usize {
        // Guards against 336.99999 style rounding of exact multiples
        (horizon / self.step_hours + 1e-9).floor() as usize + 1
    }

    /// Validate the step count for `horizon` against [Self::max_steps]
    pub(crate) fn checked_step_count(&self, horizon: f64) -> Result<usize, PharmlevelError> {
        let steps = self.step_count(horizon);
        match self.max_steps {
            Some(max_steps) if steps > max_steps => Err(PharmlevelError::HorizonTooLong {
                horizon,
                steps,
                max_steps,
            }),
            _ => Ok(steps),
        }
    }
}
