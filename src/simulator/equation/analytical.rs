use nalgebra::{Matrix2, Vector2};

use super::{Propagator, TIME_EPSILON};
use crate::{
    simulator::{CompartmentState, MicroRates},
    PharmlevelError,
};

/// Closed-form propagator for the linear absorption -> central <-> peripheral system
#[derive(Debug, Clone)]
pub struct AnalyticalStepper {
    rates: MicroRates,
    time: f64,
    x: [f64; 3],
}

impl AnalyticalStepper {
    /// Start at `t = 0` with all compartments empty
    pub fn new(rates: MicroRates) -> Self {
        AnalyticalStepper {
            rates,
            time: 0.0,
            x: [0.0; 3],
        }
    }
}

impl Propagator for AnalyticalStepper {
    fn time(&self) -> f64 {
        self.time
    }

    fn state(&self) -> CompartmentState {
        self.x.into()
    }

    fn add_to_depot(&mut self, amount: f64) {
        self.x[0] += amount;
    }

    fn advance(&mut self, t: f64) -> Result<(), PharmlevelError> {
        let dt = t - self.time;
        if dt <= TIME_EPSILON {
            return Ok(());
        }
        self.x = two_compartments_with_absorption(&self.x, &self.rates, dt);
        self.time = t;
        Ok(())
    }
}

/// Analytical solution for two compartment model with first-order absorption.
///
/// # Assumptions
/// - `x` holds the gut, central and peripheral amounts
/// - `t` is the time elapsed since `x`
///
/// `ka` may coincide with a disposition eigenvalue, the absorption terms then
/// take their confluent `t * exp(-l * t)` form.
pub fn two_compartments_with_absorption(x: &[f64; 3], rates: &MicroRates, t: f64) -> [f64; 3] {
    let MicroRates { ka, ke, kcp, kpc } = *rates;
    let (l1, l2) = rates.disposition_eigenvalues();

    let exp_l1_t = (-l1 * t).exp();
    let exp_l2_t = (-l2 * t).exp();
    let exp_ka_t = (-ka * t).exp();

    let non_zero_matrix = Matrix2::new(
        (l1 - kpc) * exp_l1_t + (kpc - l2) * exp_l2_t,
        -kpc * exp_l1_t + kpc * exp_l2_t,
        -kcp * exp_l1_t + kcp * exp_l2_t,
        (l1 - ke - kcp) * exp_l1_t + (ke + kcp - l2) * exp_l2_t,
    );
    let non_zero = (non_zero_matrix * Vector2::new(x[1], x[2])) / (l1 - l2);

    let d1 = exp_divided_difference(ka, l1, t);
    let d2 = exp_divided_difference(ka, l2, t);
    let absorption_vector = Vector2::new((l1 - kpc) * d1 + (kpc - l2) * d2, kcp * (d2 - d1));
    let absorption = absorption_vector * (ka * x[0] / (l1 - l2));

    let disposition = non_zero + absorption;
    [x[0] * exp_ka_t, disposition[0], disposition[1]]
}

/// `(exp(-b t) - exp(-a t)) / (a - b)`, continuous through `a == b` where it is `t exp(-a t)`
fn exp_divided_difference(a: f64, b: f64, t: f64) -> f64 {
    let gap = (a - b).abs() * t;
    // (1 - exp(-gap)) / gap, exp_m1 keeps it accurate for small gaps
    let relative = if gap == 0.0 {
        1.0
    } else {
        -(-gap).exp_m1() / gap
    };
    (-a.min(b) * t).exp() * t * relative
}
