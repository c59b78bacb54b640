//! Grid - square array of guarded cells with partition ownership
//!
//! Every cell sits behind its own `RwLock`. The owning worker takes it
//! uncontended for its own partition; any other thread goes through the
//! timed guard in `guard.rs`, which reports starvation instead of hanging.
//!
//! No wraparound: neighbors past an edge are simply absent and each task
//! decides what boundary condition to apply.

use std::sync::RwLock;

use crate::core::{Boundaries, SimError};
use crate::domain::Cell;

mod guard;
mod indexing;

pub struct Grid {
    size: u32,
    cells: Vec<RwLock<Cell>>,
    /// Worker id owning each cell, row-major.
    owners: Vec<usize>,
}

impl Grid {
    /// Build a `size` x `size` grid, filling each cell from `seed(x, y)`.
    pub fn new<F>(size: u32, mut seed: F) -> Result<Self, SimError>
    where
        F: FnMut(u32, u32) -> Result<Cell, SimError>,
    {
        let count = size as usize * size as usize;
        let mut cells = Vec::with_capacity(count);
        for y in 0..size {
            for x in 0..size {
                cells.push(RwLock::new(seed(x, y)?));
            }
        }
        Ok(Self { size, cells, owners: vec![0; count] })
    }

    /// Record which worker owns which partition.
    ///
    /// Partitions must not overlap; cells outside every partition stay with
    /// worker 0.
    pub fn assign_owners(&mut self, partitions: &[Boundaries]) -> Result<(), SimError> {
        for (i, a) in partitions.iter().enumerate() {
            if let Some(b) = partitions[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(SimError::Config(format!("partitions {} and {} overlap", a, b)));
            }
        }
        self.owners.iter_mut().for_each(|o| *o = 0);
        for (worker, bounds) in partitions.iter().enumerate() {
            for (x, y) in bounds.cells() {
                let idx = self.index(x, y).ok_or(SimError::OutOfBounds {
                    x: x as i64,
                    y: y as i64,
                    size: self.size,
                })?;
                self.owners[idx] = worker;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn owner_of(&self, x: u32, y: u32) -> Result<usize, SimError> {
        self.index(x, y)
            .map(|idx| self.owners[idx])
            .ok_or_else(|| self.out_of_bounds(x as i64, y as i64))
    }

    pub(crate) fn out_of_bounds(&self, x: i64, y: i64) -> SimError {
        SimError::OutOfBounds { x, y, size: self.size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Direction;

    fn blank(size: u32) -> Grid {
        Grid::new(size, |x, y| Ok(Cell::new((x + y * 10) as f64, Default::default()))).unwrap()
    }

    #[test]
    fn seed_is_row_major() {
        let grid = blank(3);
        assert_eq!(grid.cell_count(), 9);
        assert_eq!(grid.read(2, 1, |c| c.temperature()).unwrap(), 12.0);
    }

    #[test]
    fn neighbors_stop_at_edges() {
        let grid = blank(4);
        assert_eq!(grid.neighbor(0, 0, Direction::West), None);
        assert_eq!(grid.neighbor(0, 0, Direction::North), None);
        assert_eq!(grid.neighbor(3, 3, Direction::East), None);
        assert_eq!(grid.neighbor(1, 1, Direction::South), Some((1, 2)));
    }

    #[test]
    fn ownership_follows_partitions() {
        let mut grid = blank(4);
        let left = Boundaries::new(0, 2, 0, 4).unwrap();
        let right = Boundaries::new(2, 4, 0, 4).unwrap();
        grid.assign_owners(&[left, right]).unwrap();
        assert_eq!(grid.owner_of(1, 3).unwrap(), 0);
        assert_eq!(grid.owner_of(2, 0).unwrap(), 1);
        assert!(matches!(grid.owner_of(4, 0), Err(SimError::OutOfBounds { .. })));
    }

    #[test]
    fn overlapping_partitions_are_rejected() {
        let mut grid = blank(4);
        let a = Boundaries::new(0, 3, 0, 4).unwrap();
        let b = Boundaries::new(2, 4, 0, 4).unwrap();
        assert!(matches!(grid.assign_owners(&[a, b]), Err(SimError::Config(_))));
    }
}
