use serde::Serialize;

/// Drug amounts (mg) in the three compartments at one point in time
///
/// Amounts are non-negative by construction of the model; tiny negative values
/// produced by the numerical solver are kept as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CompartmentState {
    pub gut: f64,
    pub central: f64,
    pub peripheral: f64,
}

impl CompartmentState {
    pub fn new(gut: f64, central: f64, peripheral: f64) -> Self {
        CompartmentState {
            gut,
            central,
            peripheral,
        }
    }

    /// Total amount in the body, central plus peripheral
    pub fn total(&self) -> f64 {
        self.central + self.peripheral
    }

    pub fn is_finite(&self) -> bool {
        self.gut.is_finite() && self.central.is_finite() && self.peripheral.is_finite()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.gut, self.central, self.peripheral]
    }
}

impl From<[f64; 3]> for CompartmentState {
    fn from(x: [f64; 3]) -> Self {
        CompartmentState::new(x[0], x[1], x[2])
    }
}

/// One recorded grid point of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    /// Grid time in hours since the first dose
    pub time: f64,
    /// State after integrating the step that starts at `time`
    pub state: CompartmentState,
}

/// A dose as it was actually added to the depot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedDose {
    /// Position of the dose in the schedule
    pub index: usize,
    /// Time at which the depot was incremented
    pub time: f64,
    /// Bioavailable amount added to the depot (mg)
    pub amount: f64,
}

/// Dense output of the integrator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationTrace {
    points: Vec<TracePoint>,
    applied: Vec<AppliedDose>,
}

impl SimulationTrace {
    pub(crate) fn with_capacity(steps: usize, doses: usize) -> Self {
        SimulationTrace {
            points: Vec::with_capacity(steps),
            applied: Vec::with_capacity(doses),
        }
    }

    pub(crate) fn push(&mut self, time: f64, state: CompartmentState) {
        self.points.push(TracePoint { time, state });
    }

    pub(crate) fn record_dose(&mut self, dose: AppliedDose) {
        self.applied.push(dose);
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    /// Every depot addition made during the run, in application order
    pub fn applied_doses(&self) -> &[AppliedDose] {
        &self.applied
    }

    /// Sum of all depot additions (mg)
    pub fn depot_input(&self) -> f64 {
        self.applied.iter().map(|d| d.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
