//! Session registry - start/feed/stop by handle
//!
//! Owned by the serving layer; no process-wide state. Sessions never
//! observe each other. The map lock only guards lookups; each session
//! has its own lock, and inference runs under neither.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::session::MonitorSession;
use super::stream;
use super::types::{FinalReport, MonitorConfig, MonitorError, MonitorSnapshot, Sample, SessionHandle};
use crate::logic::features::FeatureVector;
use crate::logic::model::Predictor;

type SharedSession = Arc<Mutex<MonitorSession>>;

#[derive(Default)]
pub struct MonitorRegistry {
    sessions: Mutex<HashMap<SessionHandle, SharedSession>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, config: MonitorConfig) -> Result<SessionHandle, MonitorError> {
        let session = MonitorSession::new(config)?;
        let handle = SessionHandle::new();
        log::info!(
            "Monitor session {} started for fault {}",
            handle,
            session.config().target_fault_code
        );
        self.sessions.lock().insert(handle, Arc::new(Mutex::new(session)));
        Ok(handle)
    }

    pub fn feed(&self, handle: SessionHandle, sample: Sample) -> Result<MonitorSnapshot, MonitorError> {
        self.with_session(handle, |session| session.feed(sample))?
    }

    /// Predict without holding any lock, then feed the result
    pub fn observe(
        &self,
        handle: SessionHandle,
        predictor: &dyn Predictor,
        elapsed_time: f64,
        values: FeatureVector,
    ) -> Result<MonitorSnapshot, MonitorError> {
        let session = self.session(handle)?;
        let sample = stream::infer(predictor, elapsed_time, values)?;
        let mut session = session.lock();
        session.feed(sample)
    }

    /// Run `f` against one session under that session's lock
    pub fn with_session<T>(
        &self,
        handle: SessionHandle,
        f: impl FnOnce(&mut MonitorSession) -> T,
    ) -> Result<T, MonitorError> {
        let session = self.session(handle)?;
        let mut session = session.lock();
        Ok(f(&mut *session))
    }

    pub fn snapshot(&self, handle: SessionHandle) -> Result<MonitorSnapshot, MonitorError> {
        self.with_session(handle, |session| session.snapshot())
    }

    /// End a session. It stays registered so late feeds see `SessionEnded`.
    pub fn stop(&self, handle: SessionHandle) -> Result<FinalReport, MonitorError> {
        self.with_session(handle, MonitorSession::stop)
    }

    /// Forget a session entirely
    pub fn remove(&self, handle: SessionHandle) -> Option<FinalReport> {
        let session = self.sessions.lock().remove(&handle)?;
        let mut session = session.lock();
        Some(session.stop())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn session(&self, handle: SessionHandle) -> Result<SharedSession, MonitorError> {
        self.sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(MonitorError::UnknownSession(handle))
    }
}
