use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureVector;

/// Fault class id: 0 is normal operation, 1..=20 the simulated faults
pub type FaultCode = u8;

/// Identity of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId {
    pub fault_class: FaultCode,
    pub run_index: u32,
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.fault_class, self.run_index)
    }
}

/// One tabular source row: run identity, sample position and the 52 channels.
/// Column names follow the TEP dataset headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "faultNumber")]
    pub fault_class: FaultCode,
    #[serde(rename = "simulationRun")]
    pub run_index: u32,
    #[serde(rename = "sample")]
    pub sample_index: u32,
    pub features: FeatureVector,
}

impl SourceRecord {
    pub fn run_id(&self) -> RunId {
        RunId {
            fault_class: self.fault_class,
            run_index: self.run_index,
        }
    }
}
