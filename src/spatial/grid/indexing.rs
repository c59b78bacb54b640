use super::*;

use crate::core::Direction;

impl Grid {
    // === Index conversion ===
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> Option<usize> {
        self.in_bounds(x as i64, y as i64)
            .then(|| y as usize * self.size as usize + x as usize)
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (u32, u32) {
        let size = self.size as usize;
        ((idx % size) as u32, (idx / size) as u32)
    }

    // === Bounds checking ===
    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.size as i64 && y >= 0 && y < self.size as i64
    }

    /// Lateral neighbor, or `None` past the edge.
    #[inline]
    pub fn neighbor(&self, x: u32, y: u32, dir: Direction) -> Option<(u32, u32)> {
        let (dx, dy) = dir.offset();
        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
        self.in_bounds(nx, ny).then(|| (nx as u32, ny as u32))
    }
}
