//! In-memory handler for tests.

use std::time::SystemTime;

use parking_lot::Mutex;

use crate::engine::Handler;
use crate::measure::Measure;

/// Keeps every measure it receives.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    measures: Mutex<Vec<Measure>>,
}

impl RecordingHandler {
    pub fn measures(&self) -> Vec<Measure> {
        self.measures.lock().clone()
    }
}

impl Handler for RecordingHandler {
    fn handle_measures(&self, _time: SystemTime, measures: &[Measure]) {
        self.measures.lock().extend_from_slice(measures);
    }
}
