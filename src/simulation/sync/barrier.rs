//! FrameBarrier - reusable lock-step barrier with departures
//!
//! Unlike `std::sync::Barrier` a participant can leave (its party count is
//! dropped and anyone already waiting is released if they now complete the
//! generation), and the barrier can be broken so that every current and
//! future waiter gets `SimError::BarrierBroken` instead of blocking.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::core::SimError;

struct BarrierState {
    parties: usize,
    arrived: usize,
    generation: u64,
    broken: bool,
}

pub(crate) struct FrameBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl FrameBarrier {
    pub(crate) fn new(parties: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState { parties, arrived: 0, generation: 0, broken: false }),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every remaining party has arrived. Returns the index of
    /// the frame this generation opens.
    pub(crate) fn wait(&self) -> Result<u64, SimError> {
        let mut st = self.lock();
        if st.broken {
            return Err(SimError::BarrierBroken);
        }
        let generation = st.generation;
        st.arrived += 1;
        if st.arrived >= st.parties {
            st.arrived = 0;
            st.generation += 1;
            self.released.notify_all();
            return Ok(generation);
        }
        while st.generation == generation && !st.broken {
            st = self.released.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        if st.generation == generation {
            return Err(SimError::BarrierBroken);
        }
        Ok(generation)
    }

    /// Stop participating. Waiters that are now complete are released.
    pub(crate) fn leave(&self) {
        let mut st = self.lock();
        st.parties = st.parties.saturating_sub(1);
        if st.arrived > 0 && st.arrived >= st.parties {
            st.arrived = 0;
            st.generation += 1;
            self.released.notify_all();
        }
    }

    /// Fail every current and future `wait`.
    pub(crate) fn break_barrier(&self) {
        let mut st = self.lock();
        st.broken = true;
        self.released.notify_all();
    }

    /// Number of generations opened so far.
    pub(crate) fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub(crate) fn parties(&self) -> usize {
        self.lock().parties
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn lock_step_generations() {
        let barrier = Arc::new(FrameBarrier::new(3));
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let b = Arc::clone(&barrier);
                thread::spawn(move || (0..5).map(|_| b.wait().unwrap()).collect::<Vec<_>>())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(barrier.generation(), 5);
    }

    #[test]
    fn leaving_releases_waiters() {
        let barrier = Arc::new(FrameBarrier::new(2));
        let b = Arc::clone(&barrier);
        let waiter = thread::spawn(move || b.wait());
        thread::sleep(Duration::from_millis(20));
        barrier.leave();
        assert_eq!(waiter.join().unwrap(), Ok(0));
        assert_eq!(barrier.parties(), 1);
        // the remaining party now runs alone
        assert_eq!(barrier.wait(), Ok(1));
    }

    #[test]
    fn broken_barrier_fails_waiters() {
        let barrier = Arc::new(FrameBarrier::new(2));
        let b = Arc::clone(&barrier);
        let waiter = thread::spawn(move || b.wait());
        thread::sleep(Duration::from_millis(20));
        barrier.break_barrier();
        assert_eq!(waiter.join().unwrap(), Err(SimError::BarrierBroken));
        assert_eq!(barrier.wait(), Err(SimError::BarrierBroken));
    }
}
