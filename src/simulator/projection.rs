use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::{
    simulator::{PkParameters, SimulationTrace},
    PharmlevelError,
};

/// Projected amount of drug at one absolute point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    #[serde(rename = "datetime")]
    timestamp: NaiveDateTime,
    level: f64,
}

impl LevelSample {
    pub fn new(timestamp: NaiveDateTime, level: f64) -> Self {
        LevelSample { timestamp, level }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Displayed amount in mg, rounded to two decimals
    pub fn level(&self) -> f64 {
        self.level
    }
}

/// Peak metrics of a simulated profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Peak central concentration (ng/mL)
    pub cmax: f64,
    /// Hours from the first dose to `cmax`
    pub tmax: f64,
    /// Peak of central plus peripheral amount (mg)
    pub total_amount_peak: f64,
    /// `cmax` projected through the steady-state volume (mg)
    pub amount_from_cmax: f64,
    /// Total amount at peak divided by the peak concentration (L)
    pub effective_volume: Option<f64>,
}

/// Resampled levels together with the peak metrics of the full trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelProfile {
    samples: Vec<LevelSample>,
    summary: Option<ProfileSummary>,
}

impl LevelProfile {
    pub fn samples(&self) -> &[LevelSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<LevelSample> {
        self.samples
    }

    /// `None` when no dose was simulated
    pub fn summary(&self) -> Option<&ProfileSummary> {
        self.summary.as_ref()
    }
}

/// Convert a trace into displayed levels
///
/// The displayed level is the central concentration scaled by the reported
/// steady-state volume, `Cc / 1000 * Vdss`, independently of the volumes used
/// by the compartment model. Only every `stride`-th trace point is kept.
pub fn project(
    trace: &SimulationTrace,
    origin: NaiveDateTime,
    parameters: &PkParameters,
    stride: usize,
) -> Result<LevelProfile, PharmlevelError> {
    if trace.is_empty() {
        return Ok(LevelProfile::default());
    }
    let summary = summarize(trace, parameters);
    let samples = trace
        .points()
        .iter()
        .step_by(stride.max(1))
        .map(|point| {
            let concentration = parameters.central_concentration(point.state.central);
            let level = round2(concentration / 1000.0 * parameters.vdss);
            Ok(LevelSample::new(shift(origin, point.time)?, level))
        })
        .collect::<Result<Vec<_>, PharmlevelError>>()?;

    Ok(LevelProfile {
        samples,
        summary: Some(summary),
    })
}

fn summarize(trace: &SimulationTrace, parameters: &PkParameters) -> ProfileSummary {
    let mut cmax = f64::NEG_INFINITY;
    let mut tmax = 0.0;
    let mut total_amount_peak = f64::NEG_INFINITY;
    for point in trace.points() {
        let concentration = parameters.central_concentration(point.state.central);
        // First occurrence wins on ties
        if concentration > cmax {
            cmax = concentration;
            tmax = point.time;
        }
        total_amount_peak = total_amount_peak.max(point.state.total());
    }
    let cmax_mg_per_l = cmax / 1000.0;
    ProfileSummary {
        cmax,
        tmax,
        total_amount_peak,
        amount_from_cmax: cmax_mg_per_l * parameters.vdss,
        effective_volume: (cmax_mg_per_l > 0.0).then(|| total_amount_peak / cmax_mg_per_l),
    }
}

/// Add fractional hours to an absolute time, at millisecond resolution
fn shift(origin: NaiveDateTime, hours: f64) -> Result<NaiveDateTime, PharmlevelError> {
    TimeDelta::try_milliseconds((hours * 3_600_000.0).round() as i64)
        .and_then(|delta| origin.checked_add_signed(delta))
        .ok_or(PharmlevelError::TimestampOverflow { hours })
}

/// Round to two decimals, half to even on the exact binary value
///
/// `value * 100` can land on `.5` although `value` lies slightly off the tie
/// (2.675 is stored as 2.67499...). The fused residual tells those apart from
/// true ties such as 0.125.
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let residual = value.mul_add(100.0, -scaled);
    let whole = if (scaled - scaled.trunc()).abs() == 0.5 {
        if residual == 0.0 {
            scaled.round_ties_even()
        } else if (residual > 0.0) == (scaled > 0.0) {
            scaled.round()
        } else {
            scaled.trunc()
        }
    } else {
        scaled.round()
    };
    let rounded = whole / 100.0;
    // Normalize -0.0 from tiny negative solver artifacts
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
