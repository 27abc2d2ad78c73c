//! Monitor Module - Streaming detection/diagnosis timeline
//!
//! Turns noisy per-sample cascade output into debounced events:
//! calibration baseline, anomaly onset, confirmed diagnosis and
//! per-channel deviation flags.

pub mod registry;
pub mod session;
pub mod stream;
pub mod types;


pub use registry::MonitorRegistry;
pub use session::{DetectionState, MonitorSession};
pub use stream::{elapsed_from_sample, infer, observe, replay, replay_run};
pub use types::{
    FinalReport, MonitorConfig, MonitorError, MonitorSnapshot, Phase, Sample, SessionHandle,
    TimelinePoint,
};
