//! Cell guards
//!
//! `read`/`write` block and are what a worker uses on its own partition.
//! `guarded_read`/`guarded_write` poll with a deadline and turn a stalled
//! owner into `SimError::Starvation`. None of these ever hold more than one
//! cell at a time except `with_pair_mut`, which always locks the
//! lexicographically lower coordinate first.

use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use super::*;

const GUARD_POLL: Duration = Duration::from_micros(50);

impl Grid {
    fn lock_read(&self, idx: usize) -> RwLockReadGuard<'_, Cell> {
        self.cells[idx].read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_write(&self, idx: usize) -> RwLockWriteGuard<'_, Cell> {
        self.cells[idx].write().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked_index(&self, x: u32, y: u32) -> Result<usize, SimError> {
        self.index(x, y).ok_or_else(|| self.out_of_bounds(x as i64, y as i64))
    }

    pub fn read<R>(&self, x: u32, y: u32, f: impl FnOnce(&Cell) -> R) -> Result<R, SimError> {
        let idx = self.checked_index(x, y)?;
        Ok(f(&self.lock_read(idx)))
    }

    pub fn write<R>(&self, x: u32, y: u32, f: impl FnOnce(&mut Cell) -> R) -> Result<R, SimError> {
        let idx = self.checked_index(x, y)?;
        Ok(f(&mut self.lock_write(idx)))
    }

    /// Read a cell another thread may be holding; gives up after `timeout`.
    pub fn guarded_read<R>(
        &self,
        x: u32,
        y: u32,
        timeout: Duration,
        f: impl FnOnce(&Cell) -> R,
    ) -> Result<R, SimError> {
        let idx = self.checked_index(x, y)?;
        let deadline = Instant::now() + timeout;
        loop {
            match self.cells[idx].try_read() {
                Ok(cell) => return Ok(f(&cell)),
                Err(TryLockError::Poisoned(p)) => return Ok(f(&p.into_inner())),
                Err(TryLockError::WouldBlock) => {}
            }
            if Instant::now() >= deadline {
                let err = SimError::starvation(format!("cell ({}, {})", x, y));
                log::error!("{}", err);
                return Err(err);
            }
            thread::sleep(GUARD_POLL);
        }
    }

    /// Exclusive access to a cell another thread may be holding.
    pub fn guarded_write<R>(
        &self,
        x: u32,
        y: u32,
        timeout: Duration,
        f: impl FnOnce(&mut Cell) -> R,
    ) -> Result<R, SimError> {
        let idx = self.checked_index(x, y)?;
        let deadline = Instant::now() + timeout;
        loop {
            match self.cells[idx].try_write() {
                Ok(mut cell) => return Ok(f(&mut cell)),
                Err(TryLockError::Poisoned(p)) => return Ok(f(&mut p.into_inner())),
                Err(TryLockError::WouldBlock) => {}
            }
            if Instant::now() >= deadline {
                let err = SimError::starvation(format!("cell ({}, {})", x, y));
                log::error!("{}", err);
                return Err(err);
            }
            thread::sleep(GUARD_POLL);
        }
    }

    /// Hold two distinct cells at once. The argument order of the closure
    /// matches the call, whatever order the locks were taken in.
    pub fn with_pair_mut<R>(
        &self,
        a: (u32, u32),
        b: (u32, u32),
        f: impl FnOnce(&mut Cell, &mut Cell) -> R,
    ) -> Result<R, SimError> {
        let ia = self.checked_index(a.0, a.1)?;
        let ib = self.checked_index(b.0, b.1)?;
        if ia == ib {
            return Err(SimError::Config(format!("with_pair_mut needs two cells, got ({}, {}) twice", a.0, a.1)));
        }
        // (x, y) lexicographic order
        if a <= b {
            let mut first = self.lock_write(ia);
            let mut second = self.lock_write(ib);
            Ok(f(&mut first, &mut second))
        } else {
            let mut first = self.lock_write(ib);
            let mut second = self.lock_write(ia);
            Ok(f(&mut second, &mut first))
        }
    }
}
