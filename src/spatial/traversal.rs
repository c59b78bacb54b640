//! Checkerboard sweep over a partition
//!
//! A frame visits the partition in two half-passes, red cells
//! (`(x + y)` even) then black, or black then red on odd frames. Within a
//! half-pass the row's starting x shifts by one on alternating rows, so
//! no cell is updated after a same-color neighbor it reads from. Even frames
//! sweep rows top-down and x left-to-right; odd frames run both in reverse.
//! Parity is taken from absolute grid coordinates, so the colors line up
//! across partition borders.

use crate::core::Boundaries;

/// Every cell of `bounds` exactly once, in the order for `frame`.
pub fn checkerboard(bounds: Boundaries, frame: u64) -> impl Iterator<Item = (u32, u32)> {
    let forward = frame & 1 == 0;
    let halves: [u32; 2] = if forward { [0, 1] } else { [1, 0] };
    halves
        .into_iter()
        .flat_map(move |half| rows(bounds, forward).flat_map(move |y| row_cells(bounds, y, half, forward)))
}

fn rows(bounds: Boundaries, forward: bool) -> impl Iterator<Item = u32> {
    let (ly, uy) = (bounds.lower_y(), bounds.upper_y());
    (0..uy - ly).map(move |i| if forward { ly + i } else { uy - 1 - i })
}

fn row_cells(bounds: Boundaries, y: u32, half: u32, forward: bool) -> impl Iterator<Item = (u32, u32)> {
    let (lx, ux) = (bounds.lower_x() as i64, bounds.upper_x() as i64);
    let (y64, half) = (y as i64, half as i64);

    let (start, count) = if lx >= ux {
        (0, 0)
    } else if forward {
        let first = lx + (lx + y64 + half).rem_euclid(2);
        (first, if first < ux { (ux - first + 1) / 2 } else { 0 })
    } else {
        let last = (ux - 1) - ((ux - 1) + y64 + half).rem_euclid(2);
        (last, if last >= lx { (last - lx) / 2 + 1 } else { 0 })
    };
    let step = if forward { 2 } else { -2 };
    (0..count).map(move |k| ((start + step * k) as u32, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visits(bounds: Boundaries, frame: u64) -> Vec<u32> {
        let mut counter = vec![0u32; (bounds.upper_x() * bounds.upper_y()) as usize];
        for (x, y) in checkerboard(bounds, frame) {
            assert!(bounds.contains(x, y), "({}, {}) outside {}", x, y, bounds);
            counter[(y * bounds.upper_x() + x) as usize] += 1;
        }
        counter
    }

    #[test]
    fn every_cell_exactly_once_on_both_parities() {
        let b = Boundaries::new(0, 8, 0, 8).unwrap();
        for frame in 0..4 {
            let counter = visits(b, frame);
            assert!(counter.iter().all(|&c| c == 1), "frame {}: {:?}", frame, counter);
        }
    }

    #[test]
    fn odd_offsets_and_sizes_are_covered() {
        let b = Boundaries::new(3, 8, 1, 6).unwrap();
        for frame in 0..2 {
            let counter = visits(b, frame);
            let covered: u32 = b.cells().map(|(x, y)| counter[(y * 8 + x) as usize]).sum();
            assert_eq!(covered, b.area() as u32);
            assert!(b.cells().all(|(x, y)| counter[(y * 8 + x) as usize] == 1));
        }
    }

    #[test]
    fn one_color_finishes_before_the_other() {
        let b = Boundaries::new(0, 4, 0, 4).unwrap();
        let even: Vec<u32> = checkerboard(b, 0).map(|(x, y)| (x + y) % 2).collect();
        assert!(even[..8].iter().all(|&c| c == 0));
        assert!(even[8..].iter().all(|&c| c == 1));

        let odd: Vec<u32> = checkerboard(b, 1).map(|(x, y)| (x + y) % 2).collect();
        assert!(odd[..8].iter().all(|&c| c == 1));
    }

    #[test]
    fn odd_frames_run_in_reverse() {
        let b = Boundaries::new(0, 4, 0, 4).unwrap();
        let fwd: Vec<_> = checkerboard(b, 0).take(2).collect();
        let rev: Vec<_> = checkerboard(b, 1).take(2).collect();
        assert_eq!(fwd, vec![(0, 0), (2, 0)]);
        // (3, 3) is red; odd frames start with black cells on the last row
        assert_eq!(rev, vec![(2, 3), (0, 3)]);
    }

    #[test]
    fn empty_partition_yields_nothing() {
        let b = Boundaries::new(2, 2, 0, 4).unwrap();
        assert_eq!(checkerboard(b, 0).count(), 0);
    }
}
