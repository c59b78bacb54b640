//! SimulationClock - pause, step and kill control shared by all workers
//!
//! Workers consult the clock at the top of every loop iteration, before the
//! barrier, so pausing or stepping never interrupts a pass in progress.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct ClockState {
    paused: bool,
    killed: bool,
    /// Park once this many frames are done.
    run_until: Option<u64>,
    frames: Vec<u64>,
    parked: Vec<bool>,
    retired: Vec<bool>,
}

pub(crate) struct SimulationClock {
    state: Mutex<ClockState>,
    changed: Condvar,
}

impl SimulationClock {
    /// A clock for `workers` workers, starting paused.
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            state: Mutex::new(ClockState {
                paused: true,
                killed: false,
                run_until: None,
                frames: vec![0; workers],
                parked: vec![false; workers],
                retired: vec![false; workers],
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn play(&self) {
        let mut st = self.lock();
        st.paused = false;
        st.run_until = None;
        self.changed.notify_all();
    }

    pub(crate) fn pause(&self) {
        self.lock().paused = true;
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub(crate) fn shutdown(&self) {
        let mut st = self.lock();
        st.killed = true;
        self.changed.notify_all();
    }

    /// Checked again right after the barrier, so a worker released by a
    /// sibling leaving at shutdown does not run one more frame.
    pub(crate) fn is_killed(&self) -> bool {
        self.lock().killed
    }

    /// Run `frames` more frames beyond the furthest worker, then park.
    /// Returns the frame count every worker will stop at.
    pub(crate) fn advance(&self, frames: u64) -> u64 {
        let mut st = self.lock();
        let target = st.frames.iter().copied().max().unwrap_or(0) + frames;
        st.paused = false;
        st.run_until = Some(target);
        self.changed.notify_all();
        target
    }

    /// Called by worker `id` with the number of frames it has completed.
    /// Blocks while paused or past the step target. Returns `false` once the
    /// worker should exit.
    pub(crate) fn wait_runnable(&self, id: usize, frames_done: u64) -> bool {
        let mut st = self.lock();
        st.frames[id] = frames_done;
        loop {
            if st.killed {
                return false;
            }
            let at_target = st.run_until.map_or(false, |t| frames_done >= t);
            if !st.paused && !at_target {
                return true;
            }
            st.parked[id] = true;
            self.changed.notify_all();
            st = self.changed.wait(st).unwrap_or_else(PoisonError::into_inner);
            st.parked[id] = false;
        }
    }

    /// Block until every live worker is parked with `target` frames done.
    /// Leaves the clock paused. Returns the ids of retired workers.
    pub(crate) fn wait_until_parked(&self, target: u64) -> Vec<usize> {
        let mut st = self.lock();
        loop {
            let settled = (0..st.frames.len())
                .all(|i| st.retired[i] || (st.parked[i] && st.frames[i] >= target));
            if settled || st.killed {
                st.paused = true;
                st.run_until = None;
                return (0..st.retired.len()).filter(|&i| st.retired[i]).collect();
            }
            st = self.changed.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Worker `id` has left its loop for good.
    pub(crate) fn retire(&self, id: usize) {
        let mut st = self.lock();
        st.retired[id] = true;
        st.parked[id] = false;
        self.changed.notify_all();
    }

    pub(crate) fn retired(&self) -> Vec<usize> {
        let st = self.lock();
        (0..st.retired.len()).filter(|&i| st.retired[i]).collect()
    }
}
