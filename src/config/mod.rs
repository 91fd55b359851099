//! JSON configuration for the level engine
//!
//! Every field is optional; missing values fall back to the reference PK
//! parameters and the default grid settings.
//!
//! ```json
//! {
//!   "parameters": { "ka": 0.0373, "f": 0.62 },
//!   "settings": { "solver": "analytical", "max_steps": 200000 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    simulator::{PkParameters, SimulationSettings, Simulator},
    PharmlevelError,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub parameters: PkParameters,
    pub settings: SimulationSettings,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, PharmlevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PharmlevelError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validate the configuration and build a [Simulator] from it
    pub fn simulator(&self) -> Result<Simulator, PharmlevelError> {
        Simulator::new(self.parameters, self.settings.clone())
    }
}
