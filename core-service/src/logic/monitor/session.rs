//! Monitor session - per-run detection state machine
//!
//! INIT → CALIBRATING → MONITORING → ENDED. Detection and confirmation are
//! flags set while MONITORING; they never leave the phase. A session is
//! owned by its caller and mutated one sample at a time.

use std::collections::BTreeMap;

use super::types::{
    FinalReport, MonitorConfig, MonitorError, MonitorSnapshot, Phase, Sample, TimelinePoint,
};
use crate::logic::features::feature_index;

// ============================================================================
// DETECTION STATE
// ============================================================================

/// Mutable detection record of one session
#[derive(Debug, Clone, Default)]
pub struct DetectionState {
    /// Monitored channel values of each calibration sample
    calibration: Vec<Vec<f32>>,
    baseline: Option<Vec<f64>>,
    onset_time: Option<f64>,
    confirmation_time: Option<f64>,
    consecutive_matches: u32,
}

impl DetectionState {
    pub fn onset_time(&self) -> Option<f64> {
        self.onset_time
    }

    pub fn confirmation_time(&self) -> Option<f64> {
        self.confirmation_time
    }

    pub fn consecutive_matches(&self) -> u32 {
        self.consecutive_matches
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct MonitorSession {
    config: MonitorConfig,
    /// Layout index of each monitored channel
    channel_index: Vec<usize>,
    phase: Phase,
    state: DetectionState,
    timeline: Vec<TimelinePoint>,
    degraded_samples: usize,
    last_elapsed: Option<f64>,
}

impl MonitorSession {
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let channel_index = config.channels.iter().filter_map(|c| feature_index(c)).collect();

        Ok(Self {
            config,
            channel_index,
            phase: Phase::Init,
            state: DetectionState::default(),
            timeline: Vec::new(),
            degraded_samples: 0,
            last_elapsed: None,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn timeline(&self) -> &[TimelinePoint] {
        &self.timeline
    }

    pub fn is_detected(&self) -> bool {
        self.state.onset_time.is_some()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state.confirmation_time.is_some()
    }

    /// Consume one sample and return the updated state
    pub fn feed(&mut self, sample: Sample) -> Result<MonitorSnapshot, MonitorError> {
        if self.phase == Phase::Ended {
            return Err(MonitorError::SessionEnded);
        }
        let t = sample.elapsed_time;
        let in_order = t.is_finite() && self.last_elapsed.map_or(true, |prev| t > prev);
        if !in_order {
            return Err(MonitorError::OutOfOrder {
                previous: self.last_elapsed,
                received: t,
            });
        }
        self.last_elapsed = Some(t);

        if self.phase == Phase::Init {
            self.phase = Phase::Calibrating;
        }

        let readings: Vec<f32> = self
            .channel_index
            .iter()
            .map(|&i| sample.values.get(i).unwrap_or(0.0))
            .collect();

        if sample.prediction.is_none() {
            self.degraded_samples += 1;
        }

        match self.phase {
            Phase::Calibrating => self.calibrate(&readings),
            Phase::Monitoring => self.evaluate(&sample),
            Phase::Init | Phase::Ended => {}
        }

        let point = self.timeline_point(&sample, &readings);
        log::debug!(
            "t={} code={} display={} degraded={}",
            point.elapsed_time,
            point.fault_code,
            point.display_code,
            point.degraded
        );
        self.timeline.push(point);

        Ok(self.snapshot())
    }

    /// End the session. Repeated stops return the same report.
    pub fn stop(&mut self) -> FinalReport {
        if self.phase != Phase::Ended {
            self.phase = Phase::Ended;
            log::info!(
                "Monitor session ended after {} samples (fault {}, onset {:?}, confirmed {:?})",
                self.timeline.len(),
                self.config.target_fault_code,
                self.state.onset_time,
                self.state.confirmation_time
            );
        }
        self.report()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            phase: self.phase,
            detected: self.is_detected(),
            confirmed: self.is_confirmed(),
            onset_time: self.state.onset_time,
            confirmation_time: self.state.confirmation_time,
            consecutive_matches: self.state.consecutive_matches,
            samples: self.timeline.len(),
            baseline: self.named_baseline(),
            last: self.timeline.last().cloned(),
        }
    }

    fn report(&self) -> FinalReport {
        let injection = self.config.injection_time;
        let delay = |t: Option<f64>| t.map(|t| (t - injection).max(0.0));

        FinalReport {
            target_fault_code: self.config.target_fault_code,
            injection_time: injection,
            onset_time: self.state.onset_time,
            confirmation_time: self.state.confirmation_time,
            detection_delay: delay(self.state.onset_time),
            diagnosis_delay: delay(self.state.confirmation_time),
            samples: self.timeline.len(),
            degraded_samples: self.degraded_samples,
            baseline: self.named_baseline(),
            timeline: self.timeline.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn calibrate(&mut self, readings: &[f32]) {
        self.state.calibration.push(readings.to_vec());
        if self.state.calibration.len() < self.config.calibration_size {
            return;
        }

        let n = self.state.calibration.len() as f64;
        let baseline: Vec<f64> = (0..self.channel_index.len())
            .map(|c| self.state.calibration.iter().map(|row| row[c] as f64).sum::<f64>() / n)
            .collect();

        log::info!(
            "Calibration complete over {} samples: {:?}",
            self.state.calibration.len(),
            baseline
        );
        self.state.baseline = Some(baseline);
        self.phase = Phase::Monitoring;
    }

    fn evaluate(&mut self, sample: &Sample) {
        let t = sample.elapsed_time;
        // Neutral samples neither advance nor reset the debounce
        let Some(prediction) = sample.prediction else {
            return;
        };
        if t <= self.config.injection_time {
            return;
        }

        if prediction.is_anomaly && self.state.onset_time.is_none() {
            self.state.onset_time = Some(t);
            log::info!("Anomaly onset at t={}", t);
        }

        if self.state.confirmation_time.is_some() {
            return;
        }
        if prediction.fault_code == self.config.target_fault_code {
            self.state.consecutive_matches += 1;
            if self.state.consecutive_matches >= self.config.persistence_threshold {
                self.state.confirmation_time = Some(t);
                log::info!(
                    "Fault {} confirmed at t={} after {} consecutive matches",
                    self.config.target_fault_code,
                    t,
                    self.state.consecutive_matches
                );
            }
        } else {
            self.state.consecutive_matches = 0;
        }
    }

    // ------------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------------

    fn timeline_point(&self, sample: &Sample, readings: &[f32]) -> TimelinePoint {
        let prediction = sample.prediction.unwrap_or_default();
        let display_code = if sample.elapsed_time < self.config.stabilization_time {
            0
        } else {
            prediction.fault_code
        };

        let channels = self
            .config
            .channels
            .iter()
            .cloned()
            .zip(readings.iter().copied())
            .collect();

        let deviations = self
            .config
            .channels
            .iter()
            .enumerate()
            .map(|(c, name)| (name.clone(), self.is_deviating(c, readings[c])))
            .collect();

        TimelinePoint {
            elapsed_time: sample.elapsed_time,
            channels,
            is_anomaly: prediction.is_anomaly,
            fault_code: prediction.fault_code,
            display_code,
            degraded: sample.prediction.is_none(),
            deviations,
        }
    }

    /// Relative deviation `|v - b| / |b|`; zero or missing baseline is nominal
    fn is_deviating(&self, channel: usize, value: f32) -> bool {
        let Some(base) = self.state.baseline.as_ref().and_then(|b| b.get(channel).copied()) else {
            return false;
        };
        if base == 0.0 {
            return false;
        }
        (value as f64 - base).abs() / base.abs() > self.config.deviation_tolerance
    }

    fn named_baseline(&self) -> Option<BTreeMap<String, f64>> {
        self.state.baseline.as_ref().map(|b| {
            self.config
                .channels
                .iter()
                .cloned()
                .zip(b.iter().copied())
                .collect()
        })
    }
}
