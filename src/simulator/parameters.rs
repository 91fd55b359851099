use serde::{Deserialize, Serialize};

use crate::PharmlevelError;

/// Population PK parameters for the absorption -> central <-> peripheral model
///
/// The defaults are typical values from a published population PK review and
/// are used unchanged by [crate::Simulator::default].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkParameters {
    /// Apparent clearance (L/h)
    pub cl: f64,
    /// Central volume (L)
    pub vc: f64,
    /// Peripheral volume (L)
    pub vp: f64,
    /// Intercompartmental clearance (L/h)
    pub q: f64,
    /// Absorption rate constant (1/h)
    pub ka: f64,
    /// Bioavailability, fraction of each dose reaching the depot
    pub f: f64,
    /// Reported steady-state volume (L), only used when projecting levels
    pub vdss: f64,
}

impl Default for PkParameters {
    fn default() -> Self {
        PkParameters {
            cl: 0.038,
            vc: 2.47,
            vp: 4.82,
            q: 0.116,
            ka: 0.0373,
            f: 0.62,
            vdss: 10.3,
        }
    }
}

/// First-order rate constants derived from [PkParameters]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroRates {
    pub ka: f64,
    /// Elimination from the central compartment, CL/Vc
    pub ke: f64,
    /// Central to peripheral, Q/Vc
    pub kcp: f64,
    /// Peripheral to central, Q/Vp
    pub kpc: f64,
}

impl PkParameters {
    /// Reject parameter sets that cannot produce a finite simulation
    pub fn validate(&self) -> Result<(), PharmlevelError> {
        let fields = [
            ("cl", self.cl),
            ("vc", self.vc),
            ("vp", self.vp),
            ("q", self.q),
            ("ka", self.ka),
            ("f", self.f),
            ("vdss", self.vdss),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(PharmlevelError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    pub fn micro_rates(&self) -> MicroRates {
        MicroRates {
            ka: self.ka,
            ke: self.cl / self.vc,
            kcp: self.q / self.vc,
            kpc: self.q / self.vp,
        }
    }

    /// Central concentration in ng/mL for a central amount in mg
    #[inline(always)]
    pub fn central_concentration(&self, central: f64) -> f64 {
        central / self.vc * 1000.0
    }
}

impl MicroRates {
    /// Right-hand side of the compartment ODE system
    ///
    /// `x` and `dx` hold the gut, central and peripheral amounts in that order.
    #[inline(always)]
    pub fn derivative(&self, x: [f64; 3], dx: &mut [f64; 3]) {
        dx[0] = -self.ka * x[0];
        dx[1] = self.ka * x[0] - self.ke * x[1] - self.kcp * x[1] + self.kpc * x[2];
        dx[2] = self.kcp * x[1] - self.kpc * x[2];
    }

    /// Eigenvalues `(l1, l2)` of the central/peripheral disposition, `l1 > l2 > 0`
    pub fn disposition_eigenvalues(&self) -> (f64, f64) {
        // (ke + kcp + kpc)^2 - 4 ke kpc, written so it cannot go negative
        let sqrt = ((self.ke + self.kcp - self.kpc).powi(2) + 4.0 * self.kcp * self.kpc).sqrt();
        let sum = self.ke + self.kcp + self.kpc;
        ((sum + sqrt) / 2.0, (sum - sqrt) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_matches_reference_constants() {
        let p = PkParameters::default();
        assert_eq!(p.cl, 0.038);
        assert_eq!(p.vc, 2.47);
        assert_eq!(p.vp, 4.82);
        assert_eq!(p.q, 0.116);
        assert_eq!(p.ka, 0.0373);
        assert_eq!(p.f, 0.62);
        assert_eq!(p.vdss, 10.3);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn micro_rates_follow_clearances() {
        let k = PkParameters::default().micro_rates();
        assert_relative_eq!(k.ke, 0.038 / 2.47);
        assert_relative_eq!(k.kcp, 0.116 / 2.47);
        assert_relative_eq!(k.kpc, 0.116 / 4.82);
    }

    #[test]
    fn eigenvalues_solve_the_disposition_characteristic_polynomial() {
        let k = PkParameters::default().micro_rates();
        let (l1, l2) = k.disposition_eigenvalues();
        assert!(l1 > l2 && l2 > 0.0);
        assert_relative_eq!(l1 + l2, k.ke + k.kcp + k.kpc, epsilon = 1e-15);
        assert_relative_eq!(l1 * l2, k.ke * k.kpc, max_relative = 1e-12);
    }

    #[test]
    fn derivative_conserves_mass_without_elimination() {
        let p = PkParameters {
            cl: 1e-300,
            ..Default::default()
        };
        let mut dx = [0.0; 3];
        p.micro_rates().derivative([1.0, 2.0, 3.0], &mut dx);
        assert_relative_eq!(dx.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_finite_and_non_positive_values() {
        let nan = PkParameters {
            ka: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(PharmlevelError::InvalidParameter { name: "ka", .. })
        ));

        let zero = PkParameters {
            vc: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(PharmlevelError::InvalidParameter { name: "vc", .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let p: PkParameters = serde_json::from_str(r#"{"ka": 0.05}"#).unwrap();
        assert_eq!(p.ka, 0.05);
        assert_eq!(p.cl, 0.038);
    }
}
