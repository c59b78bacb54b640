//! Boundaries - immutable axis-aligned rectangle owned by one worker
//!
//! Lower bounds are inclusive, upper bounds exclusive. Created once when a
//! worker is built and never mutated afterwards.

use std::fmt;

use super::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundaries {
    lower_x: u32,
    upper_x: u32,
    lower_y: u32,
    upper_y: u32,
}

impl Boundaries {
    /// Build a rectangle from signed extents.
    ///
    /// Negative coordinates or an upper bound below its lower bound are a
    /// configuration error and are rejected immediately.
    pub fn new(lower_x: i64, upper_x: i64, lower_y: i64, upper_y: i64) -> Result<Self, SimError> {
        let negative = lower_x < 0 || upper_x < 0 || lower_y < 0 || upper_y < 0;
        let inverted = upper_x < lower_x || upper_y < lower_y;
        let too_large = upper_x > u32::MAX as i64 || upper_y > u32::MAX as i64;
        if negative || inverted || too_large {
            return Err(SimError::NegativeExtent { lower_x, upper_x, lower_y, upper_y });
        }

        Ok(Self {
            lower_x: lower_x as u32,
            upper_x: upper_x as u32,
            lower_y: lower_y as u32,
            upper_y: upper_y as u32,
        })
    }

    /// Rectangle covering a whole `size` x `size` grid.
    pub fn square(size: u32) -> Self {
        Self { lower_x: 0, upper_x: size, lower_y: 0, upper_y: size }
    }

    #[inline]
    pub fn lower_x(&self) -> u32 { self.lower_x }

    #[inline]
    pub fn upper_x(&self) -> u32 { self.upper_x }

    #[inline]
    pub fn lower_y(&self) -> u32 { self.lower_y }

    #[inline]
    pub fn upper_y(&self) -> u32 { self.upper_y }

    #[inline]
    pub fn width(&self) -> u32 { self.upper_x - self.lower_x }

    #[inline]
    pub fn height(&self) -> u32 { self.upper_y - self.lower_y }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.lower_x && x < self.upper_x && y >= self.lower_y && y < self.upper_y
    }

    /// True when the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &Boundaries) -> bool {
        self.lower_x < other.upper_x
            && other.lower_x < self.upper_x
            && self.lower_y < other.upper_y
            && other.lower_y < self.upper_y
    }

    /// Row-major iterator over every cell in the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (lx, ux) = (self.lower_x, self.upper_x);
        (self.lower_y..self.upper_y).flat_map(move |y| (lx..ux).map(move |x| (x, y)))
    }
}

impl fmt::Display for Boundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}) x [{}..{})",
            self.lower_x, self.upper_x, self.lower_y, self.upper_y
        )
    }
}
