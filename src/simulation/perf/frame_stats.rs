use serde::Serialize;

/// Running totals for one worker.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub(super) worker: usize,
    pub(super) frames: u64,
    pub(super) events_applied: u64,
    pub(super) events_deferred: u64,
    pub(super) task_passes: u64,
    pub(super) task_errors: u64,
    pub(super) task_panics: u64,
    pub(super) last_frame_ms: f64,
    pub(super) max_frame_ms: f64,
}

impl FrameStats {
    pub(crate) fn new(worker: usize) -> Self {
        FrameStats { worker, ..Default::default() }
    }

    pub(crate) fn record_frame(&mut self, elapsed_ms: f64) {
        self.frames += 1;
        self.last_frame_ms = elapsed_ms;
        self.max_frame_ms = self.max_frame_ms.max(elapsed_ms);
    }

    pub fn worker(&self) -> usize { self.worker }
    pub fn frames(&self) -> u64 { self.frames }
    pub fn events_applied(&self) -> u64 { self.events_applied }
    pub fn events_deferred(&self) -> u64 { self.events_deferred }
    pub fn task_passes(&self) -> u64 { self.task_passes }
    pub fn task_errors(&self) -> u64 { self.task_errors }
    pub fn task_panics(&self) -> u64 { self.task_panics }
    pub fn last_frame_ms(&self) -> f64 { self.last_frame_ms }
    pub fn max_frame_ms(&self) -> f64 { self.max_frame_ms }
}
